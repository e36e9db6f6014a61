//! Animation driver parameters.
//!
//! An [`Animator`] is the receiving end for discrete animation state: systems
//! write named integer parameters and whatever picks the sprite row (the
//! renderer, a controller) reads them back. Only the parameters that have
//! been written exist.

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

/// Name of the integer parameter that holds a four-way facing.
pub const DIRECTION_PARAM: &str = "Direction";

#[derive(Debug, Clone, Default, Component)]
pub struct Animator {
    pub integers: FxHashMap<String, i32>,
}

impl Animator {
    pub fn set_integer(&mut self, key: impl Into<String>, value: i32) {
        self.integers.insert(key.into(), value);
    }
    pub fn get_integer(&self, key: &str) -> Option<i32> {
        self.integers.get(key).copied()
    }
    pub fn with_integer(mut self, key: impl Into<String>, value: i32) -> Self {
        self.set_integer(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_parameter_is_none() {
        let animator = Animator::default();
        assert_eq!(animator.get_integer(DIRECTION_PARAM), None);
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let mut animator = Animator::default().with_integer(DIRECTION_PARAM, 2);
        assert_eq!(animator.get_integer(DIRECTION_PARAM), Some(2));
        animator.set_integer(DIRECTION_PARAM, 3);
        assert_eq!(animator.get_integer(DIRECTION_PARAM), Some(3));
        assert_eq!(animator.integers.len(), 1);
    }
}
