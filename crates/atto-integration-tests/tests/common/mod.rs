//! Sample application bundles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use atto_core::{Properties, PropertyValue};
use atto_framework::{BundleActivator, BundleContext, ModuleCatalog, StartHook, StopHook};
use atto_test::test_properties;

pub const CACHE: &str = "app.ICache";
pub const SESSION_STORE: &str = "app.ISessionStore";
pub const SOURCE_TYPE: &str = "app.ISourceType";

/// Connection parameters a cache bundle read from the `REDIS` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisCache {
    pub host: String,
    pub port: i64,
}

/// Registers one [`RedisCache`] as both a cache and a session store.
pub struct CacheBundle;

impl BundleActivator for CacheBundle {
    fn start_hook(&self) -> Option<&dyn StartHook> {
        Some(self)
    }

    fn stop_hook(&self) -> Option<&dyn StopHook> {
        Some(self)
    }
}

#[async_trait]
impl StartHook for CacheBundle {
    async fn start(&self, context: &BundleContext) -> anyhow::Result<()> {
        let redis = context.get_property("REDIS")?;
        let redis = redis.as_map().context("REDIS must be a table")?;
        let host = redis
            .get("HOST")
            .and_then(PropertyValue::as_str)
            .unwrap_or("localhost")
            .to_string();
        let port = redis.get("PORT").and_then(PropertyValue::as_int).unwrap_or(6379);

        let props = test_properties([("name", "redis"), ("host", host.as_str())]);
        context.register_service(
            [CACHE, SESSION_STORE],
            Arc::new(RedisCache { host, port }),
            props,
        )?;
        Ok(())
    }
}

#[async_trait]
impl StopHook for CacheBundle {
    async fn stop(&self, _context: &BundleContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Registers the SQL source types.
pub struct SqlBundle;

impl BundleActivator for SqlBundle {
    fn start_hook(&self) -> Option<&dyn StartHook> {
        Some(self)
    }

    fn stop_hook(&self) -> Option<&dyn StopHook> {
        Some(self)
    }
}

fn source_type(name: &str, label: &str) -> Properties {
    test_properties([("group", "sql"), ("name", name), ("label", label)])
}

#[async_trait]
impl StartHook for SqlBundle {
    async fn start(&self, context: &BundleContext) -> anyhow::Result<()> {
        for (name, label) in [("postgres", "PostgreSQL"), ("mysql", "MySQL")] {
            context.register_service(
                SOURCE_TYPE,
                Arc::new(name.to_string()),
                source_type(name, label),
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl StopHook for SqlBundle {
    async fn stop(&self, _context: &BundleContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Catalog with the `cache` and `sql` bundles.
pub fn app_catalog() -> ModuleCatalog {
    ModuleCatalog::new()
        .with_module("cache", CacheBundle)
        .with_module("sql", SqlBundle)
}

/// Properties pointing the cache bundle at `cache.internal:6380`.
pub fn redis_properties() -> Properties {
    let mut redis = Properties::new();
    redis.insert("HOST".into(), "cache.internal".into());
    redis.insert("PORT".into(), 6380.into());

    let mut props = Properties::new();
    props.insert("REDIS".into(), redis.into());
    props
}
