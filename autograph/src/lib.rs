//! Autograph: a declarative CRUD-resolver engine.
//!
//! Describe a [`Model`] with its fields and hooks, pick a
//! [`StorageAdapter`], and get query and mutation resolvers for it:
//!
//! ```ignore
//! use autograph::prelude::*;
//!
//! let mut schema = Schema::new(Arc::new(MemoryAdapter::new()));
//! schema.register(
//!     Model::builder("user")
//!         .field(Field::builder("id").primary())
//!         .field(Field::builder("name"))
//!         .build()?,
//! )?;
//! let users = schema.execute("user_create", json!({ "data": [{ "name": "Ada" }] }), Context::empty()).await?;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate              |
//! |----------|---------|--------------------|
//! | `memory` | **yes** | `autograph-memory` |
//! | `test`   | no      | `autograph-test`   |
//! | `full`   | no      | All of the above   |

pub use autograph_core;
pub use autograph_data;
pub use autograph_resolvers;

// Everything from the core crate at the top level.
pub use autograph_core::*;

#[cfg(feature = "memory")]
pub use autograph_memory;

#[cfg(feature = "test")]
pub use autograph_test;

/// Unified prelude: `use autograph::prelude::*`.
pub mod prelude {
    pub use autograph_core::prelude::*;
    pub use autograph_data::prelude::*;
    pub use autograph_resolvers::prelude::*;

    #[cfg(feature = "memory")]
    pub use autograph_memory::MemoryAdapter;
}
