use crate::application::errors::StorageError;
use crate::domain::entities::{Adjustment, Applied, ChannelCounter, CounterMap, Tally};
use crate::domain::traits::CounterStore;

/// In-memory view of every channel counter, written through to a store
pub struct CounterBook {
    counters: CounterMap,
    store: Box<dyn CounterStore>,
}

impl CounterBook {
    /// Load existing counters from `store`
    pub fn open(store: Box<dyn CounterStore>) -> Result<Self, StorageError> {
        let counters = store.load()?;
        tracing::info!("Loaded {} channel counter(s)", counters.len());
        Ok(Self { counters, store })
    }

    pub fn get(&self, channel: &str) -> Option<&ChannelCounter> {
        self.counters.get(channel)
    }

    pub fn counters(&self) -> &CounterMap {
        &self.counters
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Install `counter` for `channel`, replacing any previous one
    pub fn insert(&mut self, channel: &str, counter: ChannelCounter) -> Result<(), StorageError> {
        let previous = self.counters.insert(channel.to_string(), counter);
        self.commit(channel, previous)
    }

    /// `Ok(None)` if the channel has no counter yet
    pub fn adjust(
        &mut self,
        channel: &str,
        tally: Tally,
        adjustment: Adjustment,
    ) -> Result<Option<(ChannelCounter, Applied)>, StorageError> {
        let Some(counter) = self.counters.get_mut(channel) else {
            return Ok(None);
        };
        let previous = *counter;
        let applied = counter.apply(tally, adjustment);
        let counter = *counter;
        self.commit(channel, Some(previous))?;
        Ok(Some((counter, applied)))
    }

    /// `Ok(None)` if the channel has no counter yet
    pub fn reset(&mut self, channel: &str) -> Result<Option<ChannelCounter>, StorageError> {
        let Some(counter) = self.counters.get_mut(channel) else {
            return Ok(None);
        };
        let previous = *counter;
        counter.reset();
        let counter = *counter;
        self.commit(channel, Some(previous))?;
        Ok(Some(counter))
    }

    /// Save, or put `previous` back so memory never runs ahead of the store
    fn commit(&mut self, channel: &str, previous: Option<ChannelCounter>) -> Result<(), StorageError> {
        let Err(e) = self.store.save(&self.counters) else {
            return Ok(());
        };

        match previous {
            Some(counter) => {
                self.counters.insert(channel.to_string(), counter);
            }
            None => {
                self.counters.remove(channel);
            }
        }
        tracing::warn!("[{}] Save failed, change rolled back: {}", channel, e);
        Err(e)
    }
}
