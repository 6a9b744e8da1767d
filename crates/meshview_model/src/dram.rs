//! DRAM channel topology.
//!
//! Each DRAM channel owns its bank links plus one subchannel per NOC port,
//! and each subchannel carries the NOC-to-AXI bridge links the placement
//! document reports for it.

use crate::link::{LinkJson, LinkName, NetworkLink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The placement document's per-channel DRAM entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DramChannelJson {
    pub channel_id: u32,
    /// One link map per subchannel, keyed by NOC-to-AXI link name.
    #[serde(default)]
    pub subchannels: Vec<BTreeMap<String, LinkJson>>,
    #[serde(default)]
    pub dram_inout: Option<LinkJson>,
    #[serde(default)]
    pub dram0_inout: Option<LinkJson>,
    #[serde(default)]
    pub dram1_inout: Option<LinkJson>,
}

/// One DRAM channel: its bank links and subchannels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DramChannel {
    /// The channel's ID within the chip.
    pub id: u32,
    /// NOC subchannels, in document order.
    pub subchannels: Vec<DramSubchannel>,
    /// The channel's DRAM bank links.
    pub links: Vec<NetworkLink>,
}

impl DramChannel {
    /// Builds a channel from its placement document entry.
    pub fn from_json(json: &DramChannelJson) -> Result<Self, crate::link::LinkError> {
        let id = json.channel_id;
        let mut subchannels = Vec::with_capacity(json.subchannels.len());
        for (subchannel_id, link_map) in json.subchannels.iter().enumerate() {
            subchannels.push(DramSubchannel::from_json(
                subchannel_id as u32,
                id,
                link_map,
            )?);
        }

        let mut links = Vec::new();
        let bank_entries = [
            (LinkName::DramInout, &json.dram_inout),
            (LinkName::Dram0Inout, &json.dram0_inout),
            (LinkName::Dram1Inout, &json.dram1_inout),
        ];
        for (name, entry) in bank_entries {
            if let Some(link_json) = entry {
                links.push(NetworkLink::from_json(
                    name,
                    format!("{id}-{name}"),
                    link_json,
                ));
            }
        }

        Ok(Self {
            id,
            subchannels,
            links,
        })
    }
}

/// One NOC subchannel of a DRAM channel, holding its NOC-to-AXI links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DramSubchannel {
    /// Subchannel index within the channel.
    pub subchannel_id: u32,
    /// The owning channel's ID.
    pub channel_id: u32,
    /// The NOC-to-AXI bridge links for this subchannel.
    pub links: Vec<NetworkLink>,
}

impl DramSubchannel {
    fn from_json(
        subchannel_id: u32,
        channel_id: u32,
        link_map: &BTreeMap<String, LinkJson>,
    ) -> Result<Self, crate::link::LinkError> {
        let mut links = Vec::with_capacity(link_map.len());
        for (raw_name, link_json) in link_map {
            let name = LinkName::parse(raw_name)?;
            links.push(NetworkLink::from_json(
                name,
                format!("{channel_id}-{subchannel_id}-{raw_name}"),
                link_json,
            ));
        }
        Ok(Self {
            subchannel_id,
            channel_id,
            links,
        })
    }
}
