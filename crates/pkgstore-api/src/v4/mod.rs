//! The v4 handler set.
//!
//! | Kind   | Key            | Result                                  |
//! |--------|----------------|-----------------------------------------|
//! | meta   | `id`           | `{"Id", "User", "Series", "Name", "Revision"}` |
//! | meta   | `id-user`      | `{"User"}`                              |
//! | meta   | `id-series`    | `{"Series"}`                            |
//! | meta   | `id-name`      | `{"Name"}`                              |
//! | meta   | `id-revision`  | `{"Revision"}`                          |
//! | meta   | `archive-size` | `{"Size"}` from the `size` field        |
//! | meta   | `hash`         | `{"Sum"}` from the `hash` field         |
//! | meta   | `charm-metadata` | the `meta` field                      |
//! | meta   | `extra-info`   | the `extrainfo` field                   |
//! | meta   | `extra-info/`  | one key of the `extrainfo` field        |
//! | id     | `expand-id`    | every stored revision, newest first     |
//! | global | `debug/status` | `{"version", "entities"}`               |
//!
//! The field-backed facets share the [`ENTITY_GROUP`] key, so any mix of
//! them costs one document read per entity.

mod handlers;

pub use handlers::{
    new_handlers, DebugHandler, ExpandIdHandler, IdPart, ReferenceFacet, ENTITY_GROUP,
};
