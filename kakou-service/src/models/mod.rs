pub mod checkpoint;
pub mod crossing;
pub mod scope;
pub mod user;

pub use checkpoint::{Checkpoint, CheckpointView};
pub use crossing::{CrossingRecord, CrossingView, IdRange, CROSSING_FLAG};
pub use scope::{Scope, ScopeSet, ScopeView};
pub use user::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges, UserFilter, UserView};
