use std::num::NonZeroU8;
use std::time::Duration;

use futures::Future;

use crate::Dispatcher;

/// A `Runner` owns a `Dispatcher` and drives it: applying operator commands,
/// simulating the passage of time and publishing the resulting state.
/// It returns a `Response` future, which must be polled to drive its operation.
pub trait Runner<D: Dispatcher> {
    type Response: Future<Output = Result<Self::Success, Self::Error>>;
    type Success;
    type Error;

    /// Start driving the provided `Dispatcher`
    fn run(&mut self, dispatcher: D) -> Self::Response;
}

/// Allows running in fast-forward or slow-motion instead of real-time
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speed {
    #[default]
    RealTime,
    /// Speed up the runner by the provided multiplier (e.g. `2` gives double speed)
    FastForward(NonZeroU8),
    /// Slow down the runner by the provided multiplier (e.g. `2` gives half speed)
    SlowMotion(NonZeroU8),
}

impl Speed {
    pub fn fast_forward(rate: u8) -> Option<Self> {
        NonZeroU8::new(rate).map(Self::FastForward)
    }

    pub fn slow_motion(rate: u8) -> Option<Self> {
        NonZeroU8::new(rate).map(Self::SlowMotion)
    }

    pub fn adjust_duration(&self, duration: Duration) -> Duration {
        match self {
            Self::RealTime => duration,
            Self::FastForward(x) => duration / x.get() as u32,
            Self::SlowMotion(x) => duration * x.get() as u32,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_adjust_duration() {
        let five = Duration::from_secs(5);

        assert_eq!(Speed::RealTime.adjust_duration(five), five);
        assert_eq!(
            Speed::fast_forward(5).map(|s| s.adjust_duration(five)),
            Some(Duration::from_secs(1))
        );
        assert_eq!(
            Speed::slow_motion(2).map(|s| s.adjust_duration(five)),
            Some(Duration::from_secs(10))
        );
        assert_eq!(Speed::fast_forward(0), None);
    }
}
