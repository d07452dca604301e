//! Blog categories.
//!
//! Categories form a forest through `parent_id`. Readers browse them as a flat
//! list or as a tree; the admin panel gets a collapsible table and a nested
//! picker built from the same in-memory tree.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | Flat list, or tree with `?tree=true` |
//! | GET | `/api/categories/{slug}` | Get category by slug |
//! | GET | `/api/admin/categories/rows` | Admin table rows for the expanded nodes |
//! | GET | `/api/admin/categories/options` | Picker entries with selection state |
//! | POST | `/api/admin/categories` | Create category |
//! | GET | `/api/admin/categories/{id}` | Get category by id |
//! | PUT | `/api/admin/categories/{id}` | Update category |
//! | DELETE | `/api/admin/categories/{id}` | Delete category |
//! | PUT | `/api/admin/categories/{id}/default` | Make category the default (super admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod tree;

pub use services::CategoryService;
