//! シードデータ生成
//!
//! 動作確認用のダミーイベントを生成する。
//! 種別はランダムな色名、タイムスタンプは2020年内のランダムなUTC日時。
//! HTTPサーバーからは呼び出さず、`seed`バイナリから明示的に実行する。

use chrono::DateTime;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::store::Event;

/// デフォルトの生成件数
pub const DEFAULT_SEED_COUNT: usize = 400;

/// 生成範囲の開始（2020-01-01T00:00:00Z）
const RANGE_START_SECS: i64 = 1_577_836_800;

/// 生成範囲の終了（2020-12-31T00:00:00Z、この時刻を含まない）
const RANGE_END_SECS: i64 = 1_609_372_800;

/// 種別に使う色名
const COLOR_NAMES: &[&str] = &[
    "red", "green", "blue", "yellow", "orange", "purple", "pink", "brown", "black", "white",
    "gray", "cyan", "magenta", "lime", "maroon", "navy", "olive", "teal", "violet", "indigo",
    "gold", "silver", "turquoise", "salmon", "plum", "orchid", "tan", "azure", "lavender",
    "ivory", "mint green", "sky blue",
];

/// ダミーイベントを生成する
///
/// 生成したイベントはID未採番のため、`EventRepository::insert_all`で保存すること。
///
/// # Arguments
/// * `rng` - 乱数生成器
/// * `count` - 生成件数
pub fn generate_events<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Event> {
    (0..count)
        .map(|_| {
            let event_type = COLOR_NAMES.choose(&mut *rng).copied().unwrap_or("red");
            let secs = rng.random_range(RANGE_START_SECS..RANGE_END_SECS);
            let timestamp = DateTime::from_timestamp(secs, 0).map(|t| t.fixed_offset());
            Event::new(event_type, timestamp)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generate_requested_count() {
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(generate_events(&mut rng, 0).len(), 0);
        assert_eq!(generate_events(&mut rng, DEFAULT_SEED_COUNT).len(), 400);
    }

    #[test]
    fn test_generated_events_are_unassigned() {
        let mut rng = StdRng::seed_from_u64(1);

        assert!(generate_events(&mut rng, 20).iter().all(|e| e.id.is_none()));
    }

    #[test]
    fn test_generated_types_are_color_names() {
        let mut rng = StdRng::seed_from_u64(2);

        for event in generate_events(&mut rng, 100) {
            assert!(
                COLOR_NAMES.contains(&event.event_type.as_str()),
                "想定外の種別: {}",
                event.event_type
            );
        }
    }

    #[test]
    fn test_generated_timestamps_within_2020_utc() {
        let mut rng = StdRng::seed_from_u64(3);

        for event in generate_events(&mut rng, 200) {
            let timestamp = event.timestamp.expect("タイムスタンプが未設定");
            assert_eq!(timestamp.offset().local_minus_utc(), 0);
            assert!(timestamp.timestamp() >= RANGE_START_SECS);
            assert!(timestamp.timestamp() < RANGE_END_SECS);
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let first = generate_events(&mut StdRng::seed_from_u64(7), 10);
        let second = generate_events(&mut StdRng::seed_from_u64(7), 10);

        assert_eq!(first, second);
    }
}
