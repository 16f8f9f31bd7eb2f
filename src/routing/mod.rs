//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup):
//!     map_get("/api/users/{id:int}", handler)
//!     → template.rs (parse segments + constraints)
//!     → router.rs (buffer endpoint)
//!
//! Compilation (before first request):
//!     buffered endpoints
//!     → tree.rs (group by segment shape, detect duplicates)
//!     → matcher.rs (one matcher per node, siblings by precedence)
//!     → Freeze as immutable tree
//!
//! Lookup (per request):
//!     method + path → split segments → depth-first walk → Endpoint or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Most specific matcher wins: literal > typed > bounds > length > regex > any
//! - Deterministic: same input always matches same route

pub mod error;
pub mod matcher;
pub mod router;
pub mod template;
pub mod tree;

pub use error::RouteError;
pub use router::{Router, TreeRouter};
pub use template::{Constraint, RouteTemplate, Segment};
