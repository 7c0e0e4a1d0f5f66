pub mod identity;
pub mod memory;
pub mod store;
pub mod supabase;

pub use identity::{IdentityError, IdentityProvider};
pub use memory::{InMemoryIdentity, InMemoryStore};
pub use store::{Collection, Direction, DocumentStore, Query, StoreError};
pub use supabase::{SupabaseClient, SupabaseIdentity, SupabaseStore};
