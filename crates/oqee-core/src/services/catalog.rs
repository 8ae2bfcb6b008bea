use std::collections::HashMap;

use oqee_client::types::{Channel, ChannelListEntry, ServicePlan};

/// Read-only lookup tables derived from the service plan.
///
/// Logical channel numbers come from `channel_list`, where the first entry
/// for a given channel id is authoritative; later duplicates are ignored,
/// including the case where the first entry carries no number at all.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    names: HashMap<String, String>,
    numbers: HashMap<String, Option<u32>>,
    ordered: Vec<Channel>,
}

impl CatalogIndex {
    pub fn build(channels: &HashMap<String, Channel>, channel_list: &[ChannelListEntry]) -> Self {
        let names = channels
            .values()
            .map(|channel| (channel.id.clone(), channel.name.clone()))
            .collect::<HashMap<_, _>>();

        let mut numbers: HashMap<String, Option<u32>> = HashMap::new();
        for entry in channel_list {
            if !names.contains_key(&entry.channel_id) {
                continue;
            }
            numbers.entry(entry.channel_id.clone()).or_insert(entry.number);
        }

        let mut ordered: Vec<Channel> = channels.values().cloned().collect();
        ordered.sort_by_cached_key(|channel| channel_order(&channel.id));

        Self {
            names,
            numbers,
            ordered,
        }
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn number_of(&self, id: &str) -> Option<u32> {
        self.numbers.get(id).copied().flatten()
    }

    /// Channels in a stable order: numeric ids ascending, then the rest
    /// lexicographically.
    pub fn channels(&self) -> &[Channel] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The catalog as the rest of the server consumes it: the raw channel map
/// plus the derived index. Built whole, swapped whole.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub channels: HashMap<String, Channel>,
    pub index: CatalogIndex,
}

impl CatalogSnapshot {
    pub fn from_service_plan(plan: ServicePlan) -> Self {
        let index = CatalogIndex::build(&plan.channels, &plan.channel_list);
        Self {
            channels: plan.channels,
            index,
        }
    }
}

pub(crate) fn channel_order(id: &str) -> (u64, String) {
    (id.parse::<u64>().unwrap_or(u64::MAX), id.to_string())
}
