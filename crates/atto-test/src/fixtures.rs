//! Framework and property fixtures.

use atto_core::{Properties, PropertyValue};
use atto_framework::{Framework, ModuleCatalog, create_framework};

use crate::mocks::RecordingActivator;

/// Build a property map from `(key, value)` pairs.
#[must_use]
pub fn test_properties<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Catalog holding each activator under its own name.
#[must_use]
pub fn test_catalog(activators: impl IntoIterator<Item = RecordingActivator>) -> ModuleCatalog {
    activators
        .into_iter()
        .fold(ModuleCatalog::new(), |catalog, activator| {
            let name = activator.name().to_string();
            catalog.with_module(name, activator)
        })
}

/// Framework with every activator installed, in order, and no properties.
///
/// # Panics
///
/// Panics if an install fails, which cannot happen for catalog modules.
#[must_use]
pub fn test_framework(activators: impl IntoIterator<Item = RecordingActivator>) -> Framework {
    test_framework_with(activators, Properties::new())
}

/// Framework with every activator installed, in order, reading `properties`.
///
/// # Panics
///
/// Panics if an install fails, which cannot happen for catalog modules.
#[must_use]
pub fn test_framework_with(
    activators: impl IntoIterator<Item = RecordingActivator>,
    properties: Properties,
) -> Framework {
    let activators: Vec<RecordingActivator> = activators.into_iter().collect();
    let names: Vec<String> = activators.iter().map(|a| a.name().to_string()).collect();
    create_framework(test_catalog(activators), names, properties)
        .expect("catalog modules always install")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::CallLog;

    #[test]
    fn properties_from_pairs() {
        let props = test_properties([("name", "redis"), ("host", "localhost")]);
        assert_eq!(props.len(), 2);
        assert_eq!(props["name"], PropertyValue::from("redis"));
    }

    #[tokio::test]
    async fn framework_installs_in_order() {
        let log = CallLog::new();
        let framework = test_framework([
            RecordingActivator::new("a", &log),
            RecordingActivator::new("b", &log),
        ]);
        let names: Vec<String> = framework
            .bundles()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);

        framework.start().await.unwrap();
        assert_eq!(log.entries(), ["start:a", "start:b"]);
    }
}
