//! Method sets attached to routes.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::parser::Method;

/// A set of HTTP methods, stored as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodSet(u16);

impl MethodSet {
    /// The empty set.
    pub const EMPTY: MethodSet = MethodSet(0);
    /// Every method the parser understands.
    pub const ALL: MethodSet = MethodSet((1 << Method::ALL.len()) - 1);

    const fn bit(method: Method) -> u16 {
        1 << method as u16
    }

    /// The set containing only `method`.
    pub const fn of(method: Method) -> Self {
        MethodSet(Self::bit(method))
    }

    /// Add a method to the set.
    pub const fn with(self, method: Method) -> Self {
        MethodSet(self.0 | Self::bit(method))
    }

    pub fn contains(&self, method: Method) -> bool {
        self.0 & Self::bit(method) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the members in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        Method::ALL.into_iter().filter(|m| self.contains(*m))
    }

    /// Member names sorted ascending.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|m| m.as_str()).collect()
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        MethodSet::of(method)
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        iter.into_iter().fold(MethodSet::EMPTY, MethodSet::with)
    }
}

impl BitOr for MethodSet {
    type Output = MethodSet;

    fn bitor(self, rhs: MethodSet) -> MethodSet {
        MethodSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for MethodSet {
    fn bitor_assign(&mut self, rhs: MethodSet) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
