//! コマンドライン引数（2 つのホストで共通）

use clap::Args;

use crate::common::colors::OutputMode;
use crate::common::config::TestPatternConfig;
use crate::common::constants::*;

/// テストパターンの初期設定
#[derive(Debug, Clone, Args)]
pub struct PatternArgs {
    /// 1 本目のバーの輝度 (cd/m²)
    #[arg(long, default_value_t = DEFAULT_START_NITS)]
    pub start_nits: f32,

    /// 最後のバーの輝度 (cd/m²)
    #[arg(long, default_value_t = DEFAULT_END_NITS)]
    pub end_nits: f32,

    /// バーの本数 (2〜100)
    #[arg(long, default_value_t = DEFAULT_NUM_BARS)]
    pub bars: i32,

    /// ラベル文字の輝度 (cd/m²)
    #[arg(long, default_value_t = DEFAULT_LABEL_NITS)]
    pub label_nits: f32,

    /// 出力モード
    #[arg(long, value_enum, default_value_t = OutputMode::PqHdr10)]
    pub mode: OutputMode,

    /// ウィンドウ（スナップショット）の幅
    #[arg(long, default_value_t = WINDOW_WIDTH)]
    pub width: u32,

    /// ウィンドウ（スナップショット）の高さ
    #[arg(long, default_value_t = WINDOW_HEIGHT)]
    pub height: u32,
}

impl PatternArgs {
    /// 指定サイズの描画領域に対する設定（入力範囲に収めたもの）
    pub fn config(&self, width: u32, height: u32) -> TestPatternConfig {
        TestPatternConfig {
            start_nits: self.start_nits,
            end_nits: self.end_nits,
            viewport_size: (width as f32, height as f32),
            num_bars: self.bars,
            output_mode: self.mode,
            label_nits: self.label_nits,
        }
        .clamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        pattern: PatternArgs,
    }

    #[test]
    fn defaults_match_tool_defaults() {
        let cli = TestCli::parse_from(["pq-bars"]);
        let config = cli.pattern.config(1280, 800);
        assert_eq!(config, TestPatternConfig::default());
    }

    #[test]
    fn flags_are_parsed_and_clamped() {
        let cli = TestCli::parse_from([
            "pq-bars",
            "--start-nits",
            "20000",
            "--end-nits",
            "100",
            "--bars",
            "1",
            "--mode",
            "scrgb",
        ]);
        let config = cli.pattern.config(640, 480);
        assert_eq!(config.start_nits, 10000.0);
        assert_eq!(config.end_nits, 100.0);
        assert_eq!(config.num_bars, 2);
        assert_eq!(config.output_mode, OutputMode::ScrgbLinear);
        assert_eq!(config.viewport_size, (640.0, 480.0));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(TestCli::try_parse_from(["pq-bars", "--mode", "sdr"]).is_err());
    }
}
