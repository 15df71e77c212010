//! Built-in backends.
//!
//! | Module | Magic | Medium |
//! |--------|-------|--------|
//! | [`dmdfs`] | `'DMDF'` | In-memory tree or a host directory |
//! | [`dmdevfs`] | `'DMDV'` | Flat namespace of fixed-size devices |

pub mod dmdevfs;
pub mod dmdfs;
