//! Reconstruction of layers from a flat list of channel names.
//!
//! A channel name `diffuse.R` belongs to layer `diffuse.` with bare channel
//! `R`; names without a dot belong to the nameless layer. The split is on
//! the rightmost dot, so a bare channel name can never contain one.

/// Bare channel names in the order they are placed within a layer.
/// Unlisted names follow in discovery order.
pub const CHANNEL_ORDER: [&str; 11] = ["U", "V", "X", "Y", "Z", "W", "C", "R", "G", "B", "A"];

/// Channels sharing one layer prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGroup {
    /// Prefix including the trailing dot, or empty.
    pub prefix: String,
    /// Bare channel names in canonical order.
    pub channels: Vec<String>,
}

impl ChannelGroup {
    /// Prefix followed by the concatenated channel names, e.g. `diffuse.RGB`.
    pub fn display_name(&self) -> String {
        let mut name = self.prefix.clone();
        for channel in &self.channels {
            name.push_str(channel);
        }
        name
    }

    /// Full container name of a bare channel in this group.
    pub fn full_name(&self, channel: &str) -> String {
        format!("{}{}", self.prefix, channel)
    }
}

/// Splits `name` into `(prefix, bare)` at the rightmost dot. The prefix
/// keeps the dot.
pub fn split_channel_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => name.split_at(pos + 1),
        None => ("", name),
    }
}

/// Groups channel names by prefix, keeping the first-seen order of groups,
/// and orders each group's channels by [`CHANNEL_ORDER`].
pub fn group_channels<I, S>(names: I) -> Vec<ChannelGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: Vec<ChannelGroup> = Vec::new();
    for name in names {
        let (prefix, bare) = split_channel_name(name.as_ref());
        match groups.iter_mut().find(|g| g.prefix == prefix) {
            Some(group) => group.channels.push(bare.to_string()),
            None => groups.push(ChannelGroup {
                prefix: prefix.to_string(),
                channels: vec![bare.to_string()],
            }),
        }
    }

    for group in &mut groups {
        group.channels = canonical_order(std::mem::take(&mut group.channels));
    }
    groups
}

fn canonical_order(mut channels: Vec<String>) -> Vec<String> {
    let mut sorted = Vec::with_capacity(channels.len());
    for known in CHANNEL_ORDER {
        if let Some(pos) = channels.iter().position(|c| c == known) {
            sorted.push(channels.remove(pos));
        }
    }
    sorted.append(&mut channels);
    sorted
}
