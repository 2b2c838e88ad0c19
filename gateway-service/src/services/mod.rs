pub mod dispatch;
pub mod employee_client;
pub mod jwt;
pub mod permissions;
pub mod qr;
pub mod totp;

pub use dispatch::DispatchTable;
pub use employee_client::EmployeeClient;
pub use jwt::{GatewayClaims, JwtService};
pub use permissions::PermissionRule;
