use crate::application::errors::StorageError;
use crate::domain::entities::CounterMap;

/// Durable home of the channel counters.
///
/// Calls are blocking; the dispatcher handles one message at a time and
/// writes through after every mutation.
pub trait CounterStore: Send + Sync {
    /// Load every stored counter. A store that was never written is empty.
    fn load(&self) -> Result<CounterMap, StorageError>;

    /// Replace the stored counters with `counters`
    fn save(&self, counters: &CounterMap) -> Result<(), StorageError>;
}
