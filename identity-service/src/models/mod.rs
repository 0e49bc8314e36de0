//! Domain models for the identity service.

mod activity_log;
mod permission;
mod session;
mod staff;
mod user;

pub use activity_log::{describe_activity, ActivityLog, ActivityLogResponse};
pub use permission::{Permission, PERMISSION_VOCABULARY};
pub use session::Session;
pub use staff::{
    CreateStaffRequest, Department, StaffProfile, StaffResponse, StaffRole, UpdateStaffRequest,
};
pub use user::{
    CreateUserRequest, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
    UpdateUserRequest, User, UserResponse, UserStatus,
};
