// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Timing helpers for store calls.

use std::time::Duration;

use tick::Clock;

/// Result of a timed async operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timed<R> {
    pub result: R,
    pub duration: Duration,
}

pub(crate) trait ClockExt {
    /// Awaits `f` and measures how long it took on this clock.
    fn timed<F, R>(&self, f: F) -> impl Future<Output = Timed<R>>
    where
        F: Future<Output = R>;
}

impl ClockExt for Clock {
    async fn timed<F, R>(&self, f: F) -> Timed<R>
    where
        F: Future<Output = R>,
    {
        let start = self.instant();
        let result = f.await;
        Timed {
            result,
            duration: self.instant().saturating_duration_since(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_measures_clock_time() {
        futures::executor::block_on(async {
            let control = tick::ClockControl::new();
            let clock = control.to_clock();

            let timed = clock
                .timed(async {
                    control.advance(Duration::from_millis(250));
                    "done"
                })
                .await;

            assert_eq!(timed.result, "done");
            assert_eq!(timed.duration, Duration::from_millis(250));
        });
    }

    #[test]
    fn timed_on_frozen_clock_is_zero() {
        futures::executor::block_on(async {
            let timed = Clock::new_frozen().timed(async { 1 }).await;
            assert_eq!(timed.duration, Duration::ZERO);
        });
    }
}
