//! Typed views over dispatched records.
//!
//! A typed view is an [`Ec`] that the constructor table classified as a
//! particular kind, wrapped so kind-specific accessors are available.

use crate::dispatch::{COMPONENT_KIND, DESCRIBES_KEY};
use crate::ec::{Ec, Fetched, LetValue};
use crate::error::{EcError, EcResult};

/// A record that describes one or more other records.
#[derive(Clone, Debug)]
pub struct Component(Ec);

impl Component {
    /// The record(s) this component describes.
    pub fn describes(&self) -> EcResult<Fetched> {
        self.0.get(DESCRIBES_KEY)
    }

    pub fn as_ec(&self) -> &Ec {
        &self.0
    }

    pub fn into_inner(self) -> Ec {
        self.0
    }
}

impl TryFrom<Ec> for Component {
    type Error = EcError;

    fn try_from(ec: Ec) -> Result<Self, Self::Error> {
        if ec.kind() == COMPONENT_KIND {
            Ok(Self(ec))
        } else {
            Err(EcError::NotAView {
                expected: COMPONENT_KIND,
                id: ec.id().clone(),
            })
        }
    }
}

impl From<&Component> for LetValue {
    fn from(component: &Component) -> Self {
        LetValue::from(&component.0)
    }
}
