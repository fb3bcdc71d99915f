//! Pending-session store for conversational front ends.
//!
//! Each conversation key holds at most one pending photo or caption while
//! the counterpart is awaited. A second input of the same kind overwrites
//! the first (last-write-wins); offering the counterpart consumes the pair
//! and clears the key. Input ordering is a front-end policy enforced here,
//! never by the stamping engine itself.

use crate::error::{Error, InputKind, Result};
use dashmap::DashMap;

/// Which input a front end requires first, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Accept photo and caption in either order.
    #[default]
    Any,
    /// The photo must arrive before the caption.
    PhotoFirst,
    /// The caption must arrive before the photo.
    TextFirst,
}

/// Outcome of offering one input to the store.
#[derive(Debug)]
pub enum Offer {
    /// Input stored; the counterpart is still awaited.
    Stored { awaiting: InputKind },
    /// Both halves present: the pair is consumed and the key cleared.
    Ready { photo: Vec<u8>, caption: String },
}

enum Pending {
    Photo(Vec<u8>),
    Caption(String),
}

/// Per-conversation pending state, safe for concurrent front ends.
pub struct SessionStore {
    policy: OrderPolicy,
    pending: DashMap<String, Pending>,
}

impl SessionStore {
    pub fn new(policy: OrderPolicy) -> Self {
        Self {
            policy,
            pending: DashMap::new(),
        }
    }

    /// Offer a photo for a conversation key.
    pub fn offer_photo(&self, key: &str, photo: Vec<u8>) -> Result<Offer> {
        match self.pending.remove(key) {
            Some((_, Pending::Caption(caption))) => Ok(Offer::Ready { photo, caption }),
            Some((_, Pending::Photo(_))) | None => {
                if self.policy == OrderPolicy::TextFirst {
                    return Err(Error::InputMissing {
                        missing: InputKind::Caption,
                    });
                }
                self.pending.insert(key.to_string(), Pending::Photo(photo));
                Ok(Offer::Stored {
                    awaiting: InputKind::Caption,
                })
            }
        }
    }

    /// Offer caption text for a conversation key.
    pub fn offer_caption(&self, key: &str, caption: String) -> Result<Offer> {
        match self.pending.remove(key) {
            Some((_, Pending::Photo(photo))) => Ok(Offer::Ready { photo, caption }),
            Some((_, Pending::Caption(_))) | None => {
                if self.policy == OrderPolicy::PhotoFirst {
                    return Err(Error::InputMissing {
                        missing: InputKind::Photo,
                    });
                }
                self.pending
                    .insert(key.to_string(), Pending::Caption(caption));
                Ok(Offer::Stored {
                    awaiting: InputKind::Photo,
                })
            }
        }
    }

    /// Drop any pending input for a conversation key.
    pub fn clear(&self, key: &str) {
        self.pending.remove(key);
    }

    /// Number of conversations with pending input.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
