//! Type-tag registry for persisted moves and effects.
//!
//! Each move and effect kind is a plain serde struct carrying a stable type
//! tag. Records store `(tag, state)` pairs; loading looks the tag up here and
//! decodes the state into the right concrete type.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::action::Move;
use crate::effect::Effect;
use crate::error::RegistryError;

/// A serde type with a stable persistence tag.
pub trait Tagged: Serialize + DeserializeOwned + 'static {
    const TYPE: &'static str;
}

/// Object-safe view of [`Tagged`] used by trait objects.
pub trait Persist {
    fn type_tag(&self) -> &'static str;

    fn save_state(&self) -> Result<Value, serde_json::Error>;
}

impl<T: Tagged> Persist for T {
    fn type_tag(&self) -> &'static str {
        T::TYPE
    }

    fn save_state(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

type MoveDecoder = fn(Value) -> Result<Box<dyn Move>, serde_json::Error>;
type EffectDecoder = fn(Value) -> Result<Box<dyn Effect>, serde_json::Error>;
type EffectFactory = fn() -> Box<dyn Effect>;

fn decode_move<T: Move + Tagged>(value: Value) -> Result<Box<dyn Move>, serde_json::Error> {
    Ok(Box::new(serde_json::from_value::<T>(value)?))
}

fn decode_effect<T: Effect + Tagged>(value: Value) -> Result<Box<dyn Effect>, serde_json::Error> {
    Ok(Box::new(serde_json::from_value::<T>(value)?))
}

fn default_effect<T: Effect + Tagged + Default>() -> Box<dyn Effect> {
    Box::new(T::default())
}

/// Maps type tags to decoders.
#[derive(Default)]
pub struct Registry {
    moves: HashMap<&'static str, MoveDecoder>,
    effects: HashMap<&'static str, (EffectDecoder, EffectFactory)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_move<T: Move + Tagged>(&mut self) -> &mut Self {
        self.moves.insert(T::TYPE, decode_move::<T>);
        self
    }

    /// Registers an effect kind. `Default` is what `add` by type tag constructs.
    pub fn register_effect<T: Effect + Tagged + Default>(&mut self) -> &mut Self {
        self.effects
            .insert(T::TYPE, (decode_effect::<T>, default_effect::<T>));
        self
    }

    pub fn has_move(&self, tag: &str) -> bool {
        self.moves.contains_key(tag)
    }

    pub fn has_effect(&self, tag: &str) -> bool {
        self.effects.contains_key(tag)
    }

    pub fn decode_move(&self, tag: &str, state: Value) -> Result<Box<dyn Move>, RegistryError> {
        let decode = self
            .moves
            .get(tag)
            .ok_or_else(|| RegistryError::UnknownMove(tag.to_string()))?;
        decode(state).map_err(|source| RegistryError::Decode {
            tag: tag.to_string(),
            source,
        })
    }

    pub fn decode_effect(&self, tag: &str, state: Value) -> Result<Box<dyn Effect>, RegistryError> {
        let (decode, _) = self
            .effects
            .get(tag)
            .ok_or_else(|| RegistryError::UnknownEffect(tag.to_string()))?;
        decode(state).map_err(|source| RegistryError::Decode {
            tag: tag.to_string(),
            source,
        })
    }

    /// Builds a fresh default instance of the effect registered under `tag`.
    pub fn create_effect(&self, tag: &str) -> Result<Box<dyn Effect>, RegistryError> {
        self.effects
            .get(tag)
            .map(|(_, create)| create())
            .ok_or_else(|| RegistryError::UnknownEffect(tag.to_string()))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut moves: Vec<_> = self.moves.keys().collect();
        let mut effects: Vec<_> = self.effects.keys().collect();
        moves.sort();
        effects.sort();
        f.debug_struct("Registry")
            .field("moves", &moves)
            .field("effects", &effects)
            .finish()
    }
}
