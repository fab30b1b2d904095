//! Defines the ICS-721 composite class id and its hop-by-hop codec.
//!
//! A class id such as `wasm.juno1ics/channel-93/wasm.stars1ics/channel-207/stars1origin`
//! records the `{port-id}/{channel-id}` pairs an NFT class traversed, most
//! recent first, followed by the address of the contract it originates from.
use core::fmt::{Display, Error as FmtError, Formatter};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelEndpoint;
use crate::error::ClassIdError;
use crate::identifiers::{ChannelId, PortId};
use crate::CLASS_ID_DELIMITER;

/// Base class of an NFT: the origin contract address.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassId(String);

impl ClassId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ClassId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClassId {
    type Err = ClassIdError;

    fn from_str(class_id: &str) -> Result<Self, Self::Err> {
        if class_id.trim().is_empty() {
            return Err(ClassIdError::Empty);
        }
        if class_id.contains(CLASS_ID_DELIMITER) || class_id.contains(char::is_whitespace) {
            return Err(ClassIdError::InvalidOrigin {
                origin: class_id.to_string(),
            });
        }
        Ok(Self(class_id.to_string()))
    }
}

impl TryFrom<String> for ClassId {
    type Error = ClassIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<ClassId> for String {
    fn from(class_id: ClassId) -> String {
        class_id.0
    }
}

/// One bridge hop in a class trace: the port and channel on the chain that
/// received the class.
#[derive(Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TracePrefix {
    pub port_id: PortId,
    pub channel_id: ChannelId,
}

impl TracePrefix {
    pub fn new(port_id: PortId, channel_id: ChannelId) -> Self {
        Self {
            port_id,
            channel_id,
        }
    }
}

impl From<&ChannelEndpoint> for TracePrefix {
    fn from(endpoint: &ChannelEndpoint) -> Self {
        Self::new(endpoint.port.clone(), endpoint.channel.clone())
    }
}

impl Display for TracePrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}/{}", self.port_id, self.channel_id)
    }
}

/// A parsed class-id segment: either a bridge hop or the origin contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceHop {
    Bridge(TracePrefix),
    Origin(ClassId),
}

impl Display for TraceHop {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Bridge(prefix) => write!(f, "{prefix}"),
            Self::Origin(class_id) => write!(f, "{class_id}"),
        }
    }
}

/// The ordered bridge hops of a class id, most recent first.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TracePath(Vec<TracePrefix>);

impl TracePath {
    pub fn new(prefixes: Vec<TracePrefix>) -> Self {
        Self(prefixes)
    }

    /// Return empty trace path
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Returns true iff the most recent hop of this path is `prefix`.
    pub fn starts_with(&self, prefix: &TracePrefix) -> bool {
        self.0.first().map(|p| p == prefix).unwrap_or(false)
    }

    /// Removes the specified prefix from the path if there is a match, otherwise does nothing.
    pub fn remove_prefix(&mut self, prefix: &TracePrefix) {
        if self.starts_with(prefix) {
            self.0.remove(0);
        }
    }

    /// Adds the specified prefix as the most recent hop.
    pub fn add_prefix(&mut self, prefix: TracePrefix) {
        self.0.insert(0, prefix)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TracePrefix> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&TracePrefix> {
        self.0.first()
    }
}

impl Display for TracePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        let path = self
            .0
            .iter()
            .map(|prefix| prefix.to_string())
            .collect::<Vec<String>>()
            .join("/");
        write!(f, "{path}")
    }
}

/// A class id together with the bridge hops it has traversed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrefixedClassId {
    pub trace_path: TracePath,
    pub base_class_id: ClassId,
}

impl PrefixedClassId {
    /// Wraps an origin contract address that has not traversed any bridge.
    pub fn origin(base_class_id: ClassId) -> Self {
        Self {
            trace_path: TracePath::empty(),
            base_class_id,
        }
    }

    /// Returns true if the class has not traversed any bridge.
    pub fn is_origin(&self) -> bool {
        self.trace_path.is_empty()
    }

    /// Returns the hops, most recent first, ending with the origin.
    pub fn hops(&self) -> Vec<TraceHop> {
        self.trace_path
            .iter()
            .cloned()
            .map(TraceHop::Bridge)
            .chain(core::iter::once(TraceHop::Origin(self.base_class_id.clone())))
            .collect()
    }

    /// Builds a class id from hops ordered most recent first. The origin must
    /// be the last hop and appear exactly once.
    pub fn from_hops(hops: Vec<TraceHop>) -> Result<Self, ClassIdError> {
        let last = hops.len().checked_sub(1).ok_or(ClassIdError::Empty)?;
        let mut prefixes = Vec::with_capacity(last);
        let mut base_class_id = None;

        for (pos, hop) in hops.into_iter().enumerate() {
            match hop {
                TraceHop::Bridge(prefix) if pos < last => prefixes.push(prefix),
                TraceHop::Origin(class_id) if pos == last => base_class_id = Some(class_id),
                TraceHop::Bridge(prefix) => {
                    return Err(ClassIdError::MissingOrigin {
                        class_id: prefix.to_string(),
                    })
                }
                TraceHop::Origin(_) => return Err(ClassIdError::MisplacedOrigin { pos }),
            }
        }

        Ok(Self {
            trace_path: TracePath::new(prefixes),
            base_class_id: base_class_id.ok_or(ClassIdError::Empty)?,
        })
    }

    /// Returns true iff the most recent hop is `prefix`.
    pub fn starts_with(&self, prefix: &TracePrefix) -> bool {
        self.trace_path.starts_with(prefix)
    }

    /// Removes the specified prefix from the trace path if there is a match, otherwise does nothing.
    pub fn remove_trace_prefix(&mut self, prefix: &TracePrefix) {
        self.trace_path.remove_prefix(prefix)
    }

    /// Adds the specified prefix to the trace path.
    pub fn add_trace_prefix(&mut self, prefix: TracePrefix) {
        self.trace_path.add_prefix(prefix)
    }

    /// The class id one hop back along the trace, i.e. the id the class had
    /// before its most recent bridge crossing.
    pub fn previous(&self) -> Option<Self> {
        self.trace_path.first().map(|prefix| {
            let mut previous = self.clone();
            previous.remove_trace_prefix(prefix);
            previous
        })
    }
}

impl From<ClassId> for PrefixedClassId {
    fn from(class_id: ClassId) -> Self {
        Self::origin(class_id)
    }
}

impl FromStr for PrefixedClassId {
    type Err = ClassIdError;

    /// Accepts `{port}/{channel}/.../{origin}`: an odd number of non-empty
    /// segments where every leading pair is a valid port and channel id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ClassIdError::Empty);
        }

        let parts: Vec<&str> = s.split(CLASS_ID_DELIMITER).collect();
        if let Some(pos) = parts.iter().position(|part| part.is_empty()) {
            return Err(ClassIdError::EmptySegment {
                class_id: s.to_string(),
                pos,
            });
        }
        if parts.len() % 2 == 0 {
            return Err(ClassIdError::MissingOrigin {
                class_id: s.to_string(),
            });
        }

        let (origin, pairs) = parts.split_last().ok_or(ClassIdError::Empty)?;
        let mut prefixes = Vec::with_capacity(pairs.len() / 2);
        for (pos, pair) in pairs.chunks_exact(2).enumerate() {
            let port_id = PortId::from_str(pair[0]).map_err(|e| ClassIdError::InvalidPortId {
                pos,
                validation_error: e,
            })?;
            let channel_id =
                ChannelId::from_str(pair[1]).map_err(|e| ClassIdError::InvalidChannelId {
                    pos,
                    validation_error: e,
                })?;
            prefixes.push(TracePrefix::new(port_id, channel_id));
        }

        Ok(Self {
            trace_path: TracePath::new(prefixes),
            base_class_id: ClassId::from_str(origin)?,
        })
    }
}

impl TryFrom<String> for PrefixedClassId {
    type Error = ClassIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<PrefixedClassId> for String {
    fn from(class_id: PrefixedClassId) -> String {
        class_id.to_string()
    }
}

impl Display for PrefixedClassId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        if self.trace_path.is_empty() {
            write!(f, "{}", self.base_class_id)
        } else {
            write!(f, "{}/{}", self.trace_path, self.base_class_id)
        }
    }
}

/// Splits a composite class id into its hops, most recent first.
pub fn parse_class_id(class_id: &str) -> Result<Vec<TraceHop>, ClassIdError> {
    Ok(PrefixedClassId::from_str(class_id)?.hops())
}

/// Inverse of [`parse_class_id`].
pub fn join_class_id(hops: Vec<TraceHop>) -> Result<String, ClassIdError> {
    Ok(PrefixedClassId::from_hops(hops)?.to_string())
}

/// Computes the class id the destination chain will assign once the class
/// crosses from `source` to `destination`.
///
/// If the class arrived on the sending chain through `source`, the crossing
/// unwinds that hop. Otherwise the destination endpoint is prepended.
pub fn derive_next_class_id(
    current: &PrefixedClassId,
    source: &TracePrefix,
    destination: &TracePrefix,
) -> PrefixedClassId {
    let mut next = current.clone();
    if current.starts_with(source) {
        next.remove_trace_prefix(source);
    } else {
        next.add_trace_prefix(destination.clone());
    }
    next
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const STARS_PORT: &str = "wasm.stars1ve46fjrhcrum94c7d8yc2wsdz8cpuw73503e8qn9r44spr6dw0lsvmvtqh";
    const JUNO_PORT: &str = "wasm.juno1stv6sk0mvku34fj2mqrlyru6683866n306mfv52tlugtl322zmks26kg7a";

    fn prefix(port: &str, channel: &str) -> TracePrefix {
        TracePrefix::new(port.parse().expect("port"), channel.parse().expect("channel"))
    }

    #[rstest]
    #[case("stars1origin")]
    #[case("wasm.juno1bridge/channel-93/stars1origin")]
    #[case("wasm.juno1bridge/channel-93/wasm.stars1bridge/channel-207/stars1origin")]
    #[case("nft-transfer/channel-0/0x3bc5d6a2f3b4e5f6a7b8c9d0e1f2a3b4c5d6e7f8")]
    #[case("nft-transfer/channel-5/wasm.juno1bridge/channel-93/wasm.stars1bridge/channel-207/stars1origin")]
    #[case("wasm.osmo1bridge/channel-12/nft-transfer/channel-8/nft-transfer/channel-5/stars1origin")]
    #[case(
        "wasm.juno1bridge/channel-93/nft-transfer/channel-0/wasm.osmo1bridge/channel-12/nft-transfer/channel-7/0x3bc5d6a2f3b4e5f6a7b8c9d0e1f2a3b4c5d6e7f8"
    )]
    fn class_id_round_trips(#[case] class_id: &str) {
        let hops = parse_class_id(class_id).expect("success");
        assert_eq!(join_class_id(hops).expect("success"), class_id);
    }

    #[rstest]
    fn built_class_ids_round_trip(
        #[values("nft-transfer", "wasm.juno1bridge", STARS_PORT)] first_port: &str,
        #[values("wasm.osmo1bridge", "nft-transfer")] second_port: &str,
        #[values(0, 1, 3)] extra_hops: u64,
        #[values("stars1origin", "0x3bc5d6a2f3b4e5f6a7b8c9d0e1f2a3b4c5d6e7f8")] origin: &str,
    ) {
        let mut hops = vec![
            TraceHop::Bridge(prefix(first_port, "channel-1")),
            TraceHop::Bridge(prefix(second_port, "channel-2")),
        ];
        for n in 0..extra_hops {
            let port = if n % 2 == 0 { JUNO_PORT } else { "nft-transfer" };
            hops.push(TraceHop::Bridge(prefix(port, &format!("channel-{}", n + 10))));
        }
        hops.push(TraceHop::Origin(origin.parse().expect("origin")));

        let joined = join_class_id(hops.clone()).expect("success");
        let reparsed = parse_class_id(&joined).expect("success");
        assert_eq!(reparsed, hops);
        assert_eq!(join_class_id(reparsed).expect("success"), joined);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("  ")]
    #[case::missing_origin("wasm.juno1bridge/channel-93")]
    #[case::leading_delimiter("/stars1origin")]
    #[case::double_delimiter("wasm.juno1bridge//channel-93/stars1origin")]
    #[case::trailing_delimiter("wasm.juno1bridge/channel-93/stars1origin/")]
    #[case::bad_channel("wasm.juno1bridge/chan-93/stars1origin")]
    #[case::bad_port("p/channel-93/stars1origin")]
    fn malformed_class_ids_are_rejected(#[case] class_id: &str) {
        parse_class_id(class_id).expect_err("failure");
    }

    #[test]
    fn parse_orders_hops_most_recent_first() {
        let hops = parse_class_id(&format!(
            "{JUNO_PORT}/channel-93/{STARS_PORT}/channel-207/stars1origin"
        ))
        .expect("success");

        assert_eq!(
            hops,
            vec![
                TraceHop::Bridge(prefix(JUNO_PORT, "channel-93")),
                TraceHop::Bridge(prefix(STARS_PORT, "channel-207")),
                TraceHop::Origin("stars1origin".parse().expect("origin")),
            ]
        );
    }

    #[test]
    fn origin_parses_to_a_single_hop() {
        let hops = parse_class_id("stars1origin").expect("success");
        assert_eq!(hops.len(), 1);
        assert!(matches!(hops[0], TraceHop::Origin(_)));
        assert!(PrefixedClassId::from_str("stars1origin")
            .expect("success")
            .is_origin());
    }

    #[test]
    fn join_rejects_misplaced_origin() {
        let hops = vec![
            TraceHop::Origin("stars1origin".parse().expect("origin")),
            TraceHop::Bridge(prefix(JUNO_PORT, "channel-93")),
        ];
        assert_eq!(
            join_class_id(hops),
            Err(ClassIdError::MisplacedOrigin { pos: 0 })
        );
        assert_eq!(join_class_id(vec![]), Err(ClassIdError::Empty));
    }

    #[rstest]
    #[case::any_source("wasm.osmo1bridge", "channel-1")]
    #[case::matching_channel_on_other_port(STARS_PORT, "channel-207")]
    fn origin_always_prepends(#[case] source_port: &str, #[case] source_channel: &str) {
        let origin = PrefixedClassId::from_str("stars1origin").expect("success");
        let destination = prefix(JUNO_PORT, "channel-93");

        let next = derive_next_class_id(&origin, &prefix(source_port, source_channel), &destination);

        assert_eq!(next.trace_path.first(), Some(&destination));
        assert_eq!(
            next.to_string(),
            format!("{JUNO_PORT}/channel-93/stars1origin")
        );
    }

    #[test]
    fn returning_through_arrival_hop_unwinds_it() {
        let on_juno =
            PrefixedClassId::from_str(&format!("{JUNO_PORT}/channel-93/stars1origin")).expect("ok");

        let back_on_stargaze = derive_next_class_id(
            &on_juno,
            &prefix(JUNO_PORT, "channel-93"),
            &prefix(STARS_PORT, "channel-207"),
        );

        assert_eq!(back_on_stargaze.to_string(), "stars1origin");
        assert!(back_on_stargaze.is_origin());
    }

    #[test]
    fn forwarding_through_another_channel_prepends() {
        let on_juno =
            PrefixedClassId::from_str(&format!("{JUNO_PORT}/channel-93/stars1origin")).expect("ok");

        let on_osmosis = derive_next_class_id(
            &on_juno,
            &prefix(JUNO_PORT, "channel-120"),
            &prefix("wasm.osmo1bridge", "channel-4"),
        );

        assert_eq!(
            on_osmosis.to_string(),
            format!("wasm.osmo1bridge/channel-4/{JUNO_PORT}/channel-93/stars1origin")
        );
        assert_eq!(on_osmosis.previous(), Some(on_juno));
    }

    #[test]
    fn prefixed_class_id_serde_is_a_plain_string() {
        let raw = format!("\"{JUNO_PORT}/channel-93/stars1origin\"");
        let class_id: PrefixedClassId = serde_json::from_str(&raw).expect("success");
        assert_eq!(class_id.trace_path.len(), 1);
        assert_eq!(serde_json::to_string(&class_id).expect("success"), raw);
    }
}
