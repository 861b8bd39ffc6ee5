use gc_backend::BackendError;
use thiserror::Error;

use crate::CommandKind;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0} is not available")]
    Unavailable(CommandKind),

    #[error("no landing location given and no default configured")]
    MissingLandTarget,

    #[error("enter a waypoint number first")]
    EmptyWaypoint,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
