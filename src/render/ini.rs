//! WireGuard INI document model.
//!
//! A peer configuration is an ordered list of sections: one `[Interface]`
//! followed by any number of `[Peer]` sections. Each section may carry a
//! comment line naming the peer it describes.

use std::fmt;
use std::str::FromStr;

/// Section header kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Interface,
    Peer,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Interface => "Interface",
            SectionKind::Peer => "Peer",
        }
    }
}

/// One INI section with its entries in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    /// Comment text written above the header, without the leading `#`
    pub comment: Option<String>,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            comment: None,
            entries: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set a key, replacing an existing value in place.
    ///
    /// An empty value removes the key instead.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if value.is_empty() {
            self.entries.retain(|(k, _)| k != key);
            return self;
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Peer name carried by the comment.
    ///
    /// Understands both `name=<value>` fields and the `VLAN Server: <value>`
    /// / `VLAN Client: <value>` comments written by the renderers.
    pub fn name(&self) -> Option<&str> {
        let comment = self.comment.as_deref()?.trim();
        for prefix in ["VLAN Server:", "VLAN Client:"] {
            if let Some(rest) = comment.strip_prefix(prefix) {
                return Some(rest.trim());
            }
        }
        comment
            .split_whitespace()
            .find_map(|field| field.strip_prefix("name="))
    }

    pub fn set_name(&mut self, name: &str) {
        self.comment = Some(format!("name={}", name));
    }

    /// Drop keys whose value is empty
    pub fn prune(&mut self) {
        self.entries.retain(|(_, v)| !v.is_empty());
    }
}

/// A complete WireGuard peer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    interface: Section,
    peers: Vec<Section>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self::new(Section::new(SectionKind::Interface))
    }
}

impl PeerConfig {
    pub fn new(interface: Section) -> Self {
        Self {
            interface,
            peers: Vec::new(),
        }
    }

    pub fn interface(&self) -> &Section {
        &self.interface
    }

    pub fn peers(&self) -> &[Section] {
        &self.peers
    }

    pub fn push_peer(&mut self, peer: Section) {
        self.peers.push(peer);
    }

    /// First peer whose comment carries `name`
    pub fn peer(&self, name: &str) -> Option<&Section> {
        self.peers.iter().find(|peer| peer.name() == Some(name))
    }

    /// Drop empty keys everywhere, then peers left with no keys
    pub fn prune(&mut self) {
        self.interface.prune();
        for peer in &mut self.peers {
            peer.prune();
        }
        self.peers.retain(|peer| !peer.is_empty());
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(comment) = &self.comment {
            writeln!(f, "# {}", comment)?;
        }
        writeln!(f, "[{}]", self.kind.as_str())?;
        for (key, value) in self.entries() {
            if !value.is_empty() {
                writeln!(f, "{} = {}", key, value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PeerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interface)?;
        for peer in &self.peers {
            writeln!(f)?;
            write!(f, "{}", peer)?;
        }
        Ok(())
    }
}

/// Errors raised while parsing INI text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IniError {
    #[error("line {line}: unknown section [{name}]")]
    UnknownSection { line: usize, name: String },

    #[error("line {line}: entry outside of any section")]
    OrphanEntry { line: usize },

    #[error("line {line}: expected `Key = Value`")]
    Malformed { line: usize },

    #[error("[Interface] section missing")]
    MissingInterface,

    #[error("line {line}: duplicate [Interface] section")]
    DuplicateInterface { line: usize },
}

impl FromStr for PeerConfig {
    type Err = IniError;

    /// Parse INI text; `[Peer]` may repeat, `[Interface]` may not
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut interface: Option<Section> = None;
        let mut peers: Vec<Section> = Vec::new();
        let mut current: Option<Section> = None;
        let mut pending_comment: Option<String> = None;

        let mut finish = |section: Section, line: usize| -> Result<(), IniError> {
            match section.kind {
                SectionKind::Interface if interface.is_some() => {
                    Err(IniError::DuplicateInterface { line })
                }
                SectionKind::Interface => {
                    interface = Some(section);
                    Ok(())
                }
                SectionKind::Peer => {
                    peers.push(section);
                    Ok(())
                }
            }
        };

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(comment) = trimmed.strip_prefix('#').or_else(|| trimmed.strip_prefix(';')) {
                pending_comment = Some(comment.trim().to_string());
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
                let kind = match header.trim() {
                    "Interface" => SectionKind::Interface,
                    "Peer" => SectionKind::Peer,
                    other => {
                        return Err(IniError::UnknownSection {
                            line,
                            name: other.to_string(),
                        })
                    }
                };
                if let Some(done) = current.take() {
                    finish(done, line)?;
                }
                let mut section = Section::new(kind);
                section.comment = pending_comment.take();
                current = Some(section);
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .ok_or(IniError::Malformed { line })?;
            let section = current.as_mut().ok_or(IniError::OrphanEntry { line })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(IniError::Malformed { line });
            }
            // Keep `Key =` entries so that prune() has something to remove
            section.entries.push((key.to_string(), value.trim().to_string()));
            pending_comment = None;
        }

        if let Some(done) = current.take() {
            let line = text.lines().count();
            finish(done, line)?;
        }

        let interface = interface.ok_or(IniError::MissingInterface)?;
        Ok(Self { interface, peers })
    }
}
