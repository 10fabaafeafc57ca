use schema::DispatchError;
use thiserror::Error;
use tonic::Status;

/// Why a command sent to the runner did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] DispatchError),
    #[error("dispatch runner has stopped")]
    RunnerStopped,
}

impl From<CommandError> for Status {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Rejected(e) if e.is_not_found() => Status::not_found(e.to_string()),
            CommandError::Rejected(e) => Status::failed_precondition(e.to_string()),
            CommandError::RunnerStopped => Status::unavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use schema::{OrderId, RiderId};
    use tonic::Code;

    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found: Status =
            CommandError::from(DispatchError::UnknownRider(RiderId::new("9"))).into();
        assert_eq!(not_found.code(), Code::NotFound);
        assert_eq!(not_found.message(), "rider 9 does not exist");

        let closed: Status =
            CommandError::from(DispatchError::OrderClosed(OrderId::new("3"))).into();
        assert_eq!(closed.code(), Code::FailedPrecondition);

        let stopped: Status = CommandError::RunnerStopped.into();
        assert_eq!(stopped.code(), Code::Unavailable);
    }
}
