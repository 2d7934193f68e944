//! 輝度バーのレイアウト計算

use super::constants::SEP_PX;

/// 画面 Y 座標に対するバーの位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    /// バー番号 (0 = 一番上)
    pub index: i32,
    /// バー内での Y 位置
    pub pos_in_bar: f32,
    /// 上下端の区切り線に当たる行か
    pub is_separator: bool,
}

/// 1 本あたりの高さ
#[inline]
pub fn bar_height(viewport_height: f32, num_bars: i32) -> f32 {
    viewport_height / num_bars as f32
}

/// Y 座標（ピクセル中心）からバー番号と区切り線判定を求める
pub fn layout(screen_y: f32, viewport_height: f32, num_bars: i32) -> BarLayout {
    let bar_h = bar_height(viewport_height, num_bars);
    // シェーダーの clamp と同じ順序 (max してから min)。本数が 0 以下でも panic しない
    let index = ((screen_y / bar_h) as i32).max(0).min(num_bars - 1);
    let pos_in_bar = screen_y % bar_h;
    let is_separator = pos_in_bar < SEP_PX || pos_in_bar >= bar_h - SEP_PX;
    BarLayout {
        index,
        pos_in_bar,
        is_separator,
    }
}

/// バー番号に対応する目標輝度
///
/// `start*(1-t) + end*t` で補間するので両端の値はそのまま再現される。
/// 本数が 1 以下のときは t = 0（開始輝度）。
pub fn bar_nits(index: i32, num_bars: i32, start_nits: f32, end_nits: f32) -> f32 {
    let t = if num_bars > 1 {
        index as f32 / (num_bars - 1) as f32
    } else {
        0.0
    };
    start_nits * (1.0 - t) + end_nits * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_monotonic_and_covers_every_bar() {
        for &height in &[1.0f32, 37.0, 600.0, 760.0, 1080.0, 2160.0] {
            for num_bars in 2..=100 {
                let mut prev = 0;
                let mut seen = vec![false; num_bars as usize];
                for row in 0..height as i32 {
                    let y = row as f32 + 0.5;
                    let idx = layout(y, height, num_bars).index;
                    assert!(idx >= prev, "h={height} bars={num_bars} row={row}");
                    assert!((0..num_bars).contains(&idx));
                    seen[idx as usize] = true;
                    prev = idx;
                }
                assert_eq!(layout(0.0, height, num_bars).index, 0);
                let last = layout(just_below(height), height, num_bars).index;
                assert_eq!(last, num_bars - 1, "h={height} bars={num_bars}");
                if height as i32 >= 2 * num_bars {
                    assert!(seen.iter().all(|&s| s), "h={height} bars={num_bars}");
                }
            }
        }
    }

    #[test]
    fn endpoints_are_exact() {
        let cases = [(0.005f32, 0.00248f32), (0.0, 10000.0), (10000.0, 0.0), (1.5, 203.0)];
        for (start, end) in cases {
            for num_bars in 2..=100 {
                assert_eq!(bar_nits(0, num_bars, start, end), start);
                assert_eq!(bar_nits(num_bars - 1, num_bars, start, end), end);
            }
        }
    }

    #[test]
    fn single_bar_uses_start_nits() {
        assert_eq!(bar_nits(0, 1, 3.0, 9.0), 3.0);
        let l = layout(10.5, 100.0, 1);
        assert_eq!(l.index, 0);
    }

    #[test]
    fn degenerate_bar_count_does_not_panic() {
        let l = layout(5.5, 100.0, 0);
        assert_eq!(l.index, -1);
    }

    #[test]
    fn separator_rows_at_both_edges() {
        // 100px / 4 本 = 25px
        let rows: Vec<bool> = (0..25)
            .map(|row| layout(row as f32 + 0.5, 100.0, 4).is_separator)
            .collect();
        assert!(rows[0] && rows[1]);
        assert!(!rows[2] && !rows[22]);
        assert!(rows[23] && rows[24]);
        assert_eq!(rows.iter().filter(|&&s| s).count(), 4);
    }

    #[test]
    fn position_restarts_in_each_bar() {
        // 100px / 4 本 = 25px
        let top = layout(25.5, 100.0, 4);
        assert_eq!(top.index, 1);
        assert_eq!(top.pos_in_bar, 0.5);
        assert!(top.is_separator);

        let inner = layout(40.5, 100.0, 4);
        assert_eq!(inner.index, 1);
        assert_eq!(inner.pos_in_bar, 15.5);
        assert!(!inner.is_separator);

        let bottom = layout(99.5, 100.0, 4);
        assert_eq!(bottom.index, 3);
        assert_eq!(bottom.pos_in_bar, 24.5);
        assert!(bottom.is_separator);
    }

    #[test]
    fn midpoint_interpolation() {
        let mid = bar_nits(1, 3, 0.0, 100.0);
        assert_eq!(mid, 50.0);
    }

    /// 正の値のすぐ下の f32
    fn just_below(x: f32) -> f32 {
        f32::from_bits(x.to_bits() - 1)
    }
}
