//! Morse-style LED blink patterns for headless diagnostics.
//!
//! The board has no display, so startup failures are reported by blinking
//! a pattern on the status LED. Patterns are strings over a four-symbol
//! alphabet, timed in multiples of a configurable unit:
//!
//! | Symbol | Meaning                       |
//! |--------|-------------------------------|
//! | `.`    | on 1 unit, off 1 unit         |
//! | `-`    | on 3 units, off 1 unit        |
//! | ` `    | extra 3 units off (letter gap)|
//! | `_`    | extra 7 units off (word gap)  |
//!
//! Unknown symbols are skipped. The line is left low when the pattern ends.

use std::time::Duration;

use tokio::time::sleep;

use crate::traits::OutputLine;

/// Blink `pattern` on `line`, one symbol at a time.
pub async fn blink<L: OutputLine>(line: &mut L, pattern: &str, time_unit: Duration) {
    for symbol in pattern.chars() {
        match symbol {
            '.' => {
                line.set_high();
                sleep(time_unit).await;
                line.set_low();
                sleep(time_unit).await;
            }
            '-' => {
                line.set_high();
                sleep(time_unit * 3).await;
                line.set_low();
                sleep(time_unit).await;
            }
            ' ' => sleep(time_unit * 3).await,
            '_' => sleep(time_unit * 7).await,
            other => {
                tracing::debug!(symbol = %other, "skipping unknown blink symbol");
            }
        }
    }
    line.set_low();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockLineBank;
    use crate::traits::LineBank;

    const UNIT: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn sos_pulses_nine_times() {
        let mut bank = MockLineBank::new();
        let mut led = bank.claim(2).unwrap();

        blink(&mut led, "... --- ...", UNIT).await;

        let history = bank.history(2);
        let highs = history.iter().filter(|level| **level).count();
        assert_eq!(highs, 9);
        assert_eq!(history.last(), Some(&false));
    }

    #[tokio::test]
    async fn gaps_do_not_pulse() {
        let mut bank = MockLineBank::new();
        let mut led = bank.claim(2).unwrap();

        blink(&mut led, " _ ", UNIT).await;

        // Only the trailing safety set_low, never a high
        assert!(bank.history(2).iter().all(|level| !level));
    }

    #[tokio::test]
    async fn unknown_symbols_are_skipped() {
        let mut bank = MockLineBank::new();
        let mut led = bank.claim(2).unwrap();

        blink(&mut led, ".x.", UNIT).await;

        let highs = bank.history(2).iter().filter(|level| **level).count();
        assert_eq!(highs, 2);
    }

    #[tokio::test]
    async fn line_ends_low() {
        let mut bank = MockLineBank::new();
        let mut led = bank.claim(2).unwrap();

        blink(&mut led, "-", UNIT).await;
        assert_eq!(bank.level(2), Some(false));
    }
}
