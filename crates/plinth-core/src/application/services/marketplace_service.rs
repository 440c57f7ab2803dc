//! Marketplace Service - plugin lookup operations.

use std::sync::Arc;

use tracing::debug;

use crate::{
    application::ports::Marketplace,
    domain::MarketplacePlugin,
    error::CoreResult,
};

/// Package of the Amazon Alexa platform plugin.
pub const ALEXA_PACKAGE: &str = "@jovotech/platform-alexa";

/// Package of the AWS Lambda server plugin.
pub const LAMBDA_PACKAGE: &str = "@jovotech/server-lambda";

/// Service for querying a marketplace.
#[derive(Clone)]
pub struct MarketplaceService {
    marketplace: Arc<dyn Marketplace>,
}

impl MarketplaceService {
    pub fn new(marketplace: Arc<dyn Marketplace>) -> Self {
        Self { marketplace }
    }

    /// List all plugins.
    pub fn list(&self) -> CoreResult<Vec<MarketplacePlugin>> {
        self.marketplace.plugins()
    }

    /// Plugins carrying `tag`.
    pub fn by_tag(&self, tag: &str) -> CoreResult<Vec<MarketplacePlugin>> {
        let tag = tag.trim();
        Ok(self
            .list()?
            .into_iter()
            .filter(|p| p.has_tag(tag))
            .collect())
    }

    /// Find a plugin by its exact package identifier.
    pub fn find_by_package(&self, package: &str) -> CoreResult<Option<MarketplacePlugin>> {
        Ok(self.list()?.into_iter().find(|p| p.package == package))
    }

    /// The Amazon Alexa platform plugin.
    pub fn alexa_plugin(&self) -> CoreResult<Option<MarketplacePlugin>> {
        self.find_by_package(ALEXA_PACKAGE)
    }

    /// The AWS Lambda server plugin.
    pub fn lambda_plugin(&self) -> CoreResult<Option<MarketplacePlugin>> {
        self.find_by_package(LAMBDA_PACKAGE)
    }

    /// Resolve a user selector (name, module, package or package suffix)
    /// to a plugin. The first listed match wins.
    pub fn resolve(&self, selector: &str) -> CoreResult<Option<MarketplacePlugin>> {
        let found = self.list()?.into_iter().find(|p| p.matches(selector));
        debug!(selector, found = ?found.as_ref().map(|p| &p.package), "Resolved plugin selector");
        Ok(found)
    }
}

impl std::fmt::Debug for MarketplaceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tags;

    struct Fixed;

    impl Marketplace for Fixed {
        fn plugins(&self) -> CoreResult<Vec<MarketplacePlugin>> {
            Ok(vec![
                MarketplacePlugin {
                    name: "Amazon Alexa".into(),
                    module: "AlexaPlatform".into(),
                    package: ALEXA_PACKAGE.into(),
                    cli_module: Some("AlexaCli".into()),
                    description: "Build apps for Amazon Alexa".into(),
                    tags: Tags::parse("platforms"),
                },
                MarketplacePlugin {
                    name: "FileDb".into(),
                    module: "FileDb".into(),
                    package: "@jovotech/db-filedb".into(),
                    cli_module: None,
                    description: "Store user data in a local JSON file".into(),
                    tags: Tags::parse("databases"),
                },
            ])
        }
    }

    fn service() -> MarketplaceService {
        MarketplaceService::new(Arc::new(Fixed))
    }

    #[test]
    fn alexa_lookup_returns_platform_plugin() {
        let alexa = service().alexa_plugin().unwrap().unwrap();
        assert_eq!(alexa.module, "AlexaPlatform");
        assert_eq!(alexa.tags, Tags::parse("platforms"));
    }

    #[test]
    fn missing_package_is_none() {
        assert!(service().lambda_plugin().unwrap().is_none());
    }

    #[test]
    fn tag_filter_and_selector_resolution() {
        let svc = service();
        let databases = svc.by_tag("databases").unwrap();
        assert_eq!(databases.len(), 1);
        assert_eq!(databases[0].name, "FileDb");

        assert_eq!(svc.resolve("alexa").unwrap().unwrap().package, ALEXA_PACKAGE);
        assert!(svc.resolve("dynamodb").unwrap().is_none());
    }
}
