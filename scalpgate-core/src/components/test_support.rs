use chrono::{TimeZone, Utc};

use crate::domain::{CandleContext, ModelVerdict};

/// A context on which every entry condition holds and no exit condition fires.
pub fn entry_ready_context() -> CandleContext {
    CandleContext {
        instrument_id: "BTC/USDT".into(),
        candle_close_time: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        open: 99.5,
        high: 100.5,
        low: 99.0,
        close: 100.0,
        volume: 1500.0,
        rolling_volume_mean: 1000.0,
        rsi: 25.0,
        macd: 0.5,
        macd_signal: 0.3,
        ema_fast: 99.0,
        ema_slow: 98.0,
        bollinger_lower: 96.0,
        bollinger_mid: 100.0,
        bollinger_upper: 104.0,
        atr: 1.0,
        model_class_verdict: ModelVerdict::Favorable,
        model_confidence: 0.8,
    }
}
