//! Slot id generation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::config::{RenderConfig, SlotIdStrategy};

/// Source of slot id tokens.
///
/// A fresh generator is created for every render invocation. Tokens must
/// only contain `[A-Za-z0-9_-]` so ids can be written into attributes
/// unescaped.
pub trait SlotIdGenerator: Send {
    fn next_token(&mut self) -> String;
}

/// Short random tokens from a UUID v4.
#[derive(Debug, Default)]
pub struct RandomSlotIds;

impl SlotIdGenerator for RandomSlotIds {
    fn next_token(&mut self) -> String {
        let mut token = Uuid::new_v4().simple().to_string();
        token.truncate(10);
        token
    }
}

/// Counter tokens `0`, `1`, `2`, ...
#[derive(Debug, Default)]
pub struct SequentialSlotIds {
    next: u64,
}

impl SlotIdGenerator for SequentialSlotIds {
    fn next_token(&mut self) -> String {
        let token = self.next.to_string();
        self.next += 1;
        token
    }
}

/// Factory for custom generators.
pub type SlotIdFactory = Arc<dyn Fn() -> Box<dyn SlotIdGenerator> + Send + Sync>;

/// Slot ids issued within one render invocation.
pub(crate) struct SlotIds {
    prefix: String,
    generator: Box<dyn SlotIdGenerator>,
    issued: HashSet<String>,
    fallback: u64,
}

/// Draws allowed per id before falling back to a counter token.
const MAX_DRAWS: usize = 8;

impl SlotIds {
    pub(crate) fn new(config: &RenderConfig, factory: Option<&SlotIdFactory>) -> Self {
        let generator: Box<dyn SlotIdGenerator> = match (factory, config.slot_ids) {
            (Some(factory), _) => factory(),
            (None, SlotIdStrategy::Random) => Box::new(RandomSlotIds),
            (None, SlotIdStrategy::Sequential) => Box::new(SequentialSlotIds::default()),
        };

        Self {
            prefix: config.slot_id_prefix.clone(),
            generator,
            issued: HashSet::new(),
            fallback: 0,
        }
    }

    /// Issue an id not yet used in this invocation.
    ///
    /// Tokens that repeat or contain characters outside `[A-Za-z0-9_-]` are
    /// redrawn. After `MAX_DRAWS` rejected tokens a counter token is used
    /// instead.
    pub(crate) fn next_id(&mut self) -> String {
        for _ in 0..MAX_DRAWS {
            let token = self.generator.next_token();
            if !is_valid_token(&token) {
                warn!("Ignoring slot id token {:?} with unsupported characters", token);
                continue;
            }
            let id = format!("{}{}", self.prefix, token);
            if self.issued.insert(id.clone()) {
                return id;
            }
        }

        warn!(
            "Slot id generator produced no usable token in {} draws, using a counter",
            MAX_DRAWS
        );
        loop {
            let id = format!("{}{}", self.prefix, self.fallback);
            self.fallback += 1;
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }

    pub(crate) fn issued(&self) -> usize {
        self.issued.len()
    }
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
