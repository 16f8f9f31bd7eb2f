//! Application registration API.
//!
//! # Lifecycle
//! ```text
//! WebApplicationBuilder
//!     → options / CLI arguments / configuration sources / services
//!     → build()         environment, layered configuration, settings
//! WebApplication
//!     → map_* / use_*   routes and middleware
//!     → into_engine()   compile routes, prebuild singletons, resolve chain
//!     → serve() / run() bind listeners until shutdown
//! ```
//!
//! # Design Decisions
//! - Configuration, Environment and ServerSettings are registered as
//!   singletons unless the application registered its own
//! - Route and service errors surface at startup, never per request
//! - `run()` owns the runtime; `serve()` is for callers that already have one

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::config::schema::build_environment;
use crate::config::{
    validate_settings, ConfigError, Configuration, ConfigurationBuilder, Environment,
    EnvironmentOptions, ServerSettings, ValidationError,
};
use crate::di::{DiError, ServiceCollection, ServiceProvider};
use crate::engine::context::Context;
use crate::engine::dispatch::WebApplicationEngine;
use crate::engine::endpoint::Endpoint;
use crate::engine::error::RequestError;
use crate::engine::handler::Handler;
use crate::http::server::HttpServer;
use crate::lifecycle::signals::listen_for_signals;
use crate::lifecycle::{Shutdown, StartupError};
use crate::middleware::{
    FactoryCreator, FnCreator, Middleware, MiddlewareCreator, MiddlewareCreators, Next,
    TypeCreator,
};
use crate::observability::{self, LoggingSettings};
use crate::routing::{RouteError, Router, TreeRouter};

/// Configuration key of the Prometheus listener address.
pub const METRICS_ADDRESS_KEY: &str = "Metrics.Address";

pub struct WebApplicationBuilder {
    options: EnvironmentOptions,
    args: Vec<String>,
    configuration: ConfigurationBuilder,
    services: ServiceCollection,
    router: Box<dyn Router>,
    urls: Vec<String>,
    threads_number: Option<u16>,
}

impl WebApplicationBuilder {
    pub fn new() -> Self {
        Self {
            options: EnvironmentOptions::default(),
            args: Vec::new(),
            configuration: ConfigurationBuilder::new(),
            services: ServiceCollection::new(),
            router: Box::new(TreeRouter::new()),
            urls: Vec::new(),
            threads_number: None,
        }
    }

    pub fn with_options(mut self, options: EnvironmentOptions) -> Self {
        self.options = options;
        self
    }

    /// Command line `key=value` overrides. Rejected here if malformed.
    pub fn with_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        crate::config::loader::parse_cli_args(&args)?;
        self.args = args;
        Ok(self)
    }

    /// In-memory configuration; files, variables and arguments are layered on top.
    pub fn configuration(&mut self) -> &mut ConfigurationBuilder {
        &mut self.configuration
    }

    pub fn services(&mut self) -> &mut ServiceCollection {
        &mut self.services
    }

    pub fn add_services(&mut self, services: ServiceCollection) -> Result<&mut Self, DiError> {
        self.services.merge(services)?;
        Ok(self)
    }

    /// Override the configured listen URLs.
    pub fn use_urls<I, S>(&mut self, urls: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Override the configured worker thread count.
    pub fn use_threads(&mut self, threads: u16) -> &mut Self {
        self.threads_number = Some(threads);
        self
    }

    /// Replace the default tree router.
    pub fn use_router(&mut self, router: impl Router + 'static) -> &mut Self {
        self.router = Box::new(router);
        self
    }

    pub fn build(self) -> Result<WebApplication, StartupError> {
        let Self {
            options,
            args,
            mut configuration,
            mut services,
            router,
            urls,
            threads_number,
        } = self;

        let cli = crate::config::loader::parse_cli_args(&args)?;
        let environment = build_environment(&options, std::env::vars(), &cli);

        configuration
            .add_app_settings(&environment.content_root_path, &environment.environment_name)?
            .add_env_vars(options.prefix())
            .add_cli_args(&args)?;
        let configuration = configuration.build();

        let mut settings = ServerSettings::from_configuration(&configuration)?;
        if !urls.is_empty() {
            settings.urls = urls;
        }
        if let Some(threads) = threads_number {
            settings.threads_number = threads;
        }
        let settings = settings.resolved();
        validate_settings(&settings).map_err(ConfigError::Validation)?;

        register_instance(&mut services, configuration.clone())?;
        register_instance(&mut services, environment.clone())?;
        register_instance(&mut services, settings.clone())?;

        tracing::debug!(
            environment = %environment.environment_name,
            urls = ?settings.urls,
            threads = settings.threads_number,
            "Application built"
        );

        Ok(WebApplication {
            router,
            services: ServiceProvider::new(services),
            creators: MiddlewareCreators::new(),
            configuration,
            environment,
            settings,
        })
    }
}

impl Default for WebApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Register `value` as a singleton unless the type is already registered.
fn register_instance<T>(services: &mut ServiceCollection, value: T) -> Result<(), DiError>
where
    T: Clone + Send + Sync + 'static,
{
    if !services.contains::<T>() {
        services.add_singleton_with::<T, T, _>(move |_| Ok(value.clone()))?;
    }
    Ok(())
}

/// A built application: register routes and middleware, then run.
pub struct WebApplication {
    router: Box<dyn Router>,
    services: ServiceProvider,
    creators: MiddlewareCreators,
    configuration: Configuration,
    environment: Environment,
    settings: ServerSettings,
}

impl WebApplication {
    pub fn builder() -> WebApplicationBuilder {
        WebApplicationBuilder::new()
    }

    /// Root service provider.
    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn map<H, Args>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
    ) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let endpoint = Endpoint::new(method, template, handler)?;
        Ok(self.router.add_endpoint(endpoint))
    }

    pub fn map_get<H, Args>(&mut self, template: &str, handler: H) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(Method::GET, template, handler)
    }

    pub fn map_post<H, Args>(&mut self, template: &str, handler: H) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(Method::POST, template, handler)
    }

    pub fn map_put<H, Args>(&mut self, template: &str, handler: H) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(Method::PUT, template, handler)
    }

    pub fn map_patch<H, Args>(&mut self, template: &str, handler: H) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(Method::PATCH, template, handler)
    }

    pub fn map_delete<H, Args>(&mut self, template: &str, handler: H) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(Method::DELETE, template, handler)
    }

    pub fn map_head<H, Args>(&mut self, template: &str, handler: H) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(Method::HEAD, template, handler)
    }

    pub fn map_options<H, Args>(&mut self, template: &str, handler: H) -> Result<&mut Endpoint, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(Method::OPTIONS, template, handler)
    }

    /// Closure middleware: `|ctx, next| Box::pin(async move { next.run(ctx).await })`.
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), RequestError>>
            + Send
            + Sync
            + 'static,
    {
        self.use_creator(Arc::new(FnCreator::new(f)))
    }

    /// A fresh `M::default()` per request.
    pub fn use_middleware<M>(&mut self) -> &mut Self
    where
        M: Middleware + Default + 'static,
    {
        self.use_creator(Arc::new(TypeCreator::<M>::new()))
    }

    /// A middleware built per request by `factory`.
    pub fn use_middleware_with<F, M>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(&Context) -> Result<M, RequestError> + Send + Sync + 'static,
        M: Middleware + 'static,
    {
        self.use_creator(Arc::new(FactoryCreator::new(factory)))
    }

    pub fn use_creator(&mut self, creator: Arc<dyn MiddlewareCreator>) -> &mut Self {
        self.creators.add(creator);
        self
    }

    /// Place route matching here instead of at the front of the chain.
    pub fn use_router(&mut self) -> &mut Self {
        self.creators.add_router();
        self
    }

    /// Place endpoint execution here instead of at the end of the chain.
    pub fn use_endpoints(&mut self) -> &mut Self {
        self.creators.add_endpoints();
        self
    }

    /// Compile routes, build singletons and resolve the middleware chain.
    pub fn into_engine(self) -> Result<WebApplicationEngine, StartupError> {
        let Self {
            mut router,
            services,
            creators,
            ..
        } = self;

        router.compile()?;
        services.prebuild_singletons()?;

        let router: Arc<dyn Router> = Arc::from(router);
        let pipeline = crate::middleware::Pipeline::new(creators.resolve(Arc::clone(&router)));
        tracing::debug!(middlewares = pipeline.len(), "Middleware pipeline resolved");

        Ok(WebApplicationEngine::new(router, services, pipeline))
    }

    /// Serve on the current runtime until `shutdown` fires.
    pub async fn serve(self, shutdown: Shutdown) -> Result<(), StartupError> {
        if let Some(address) = metrics_address(&self.configuration)? {
            if let Err(e) = observability::metrics::init_metrics(address) {
                tracing::error!(address = %address, error = %e, "Failed to start metrics exporter");
            }
        }

        let settings = self.settings.clone();
        let engine = Arc::new(self.into_engine()?);
        HttpServer::new(engine, settings).run(shutdown).await
    }

    /// Initialize logging, start the runtime and serve until a termination
    /// signal. Blocks the calling thread.
    pub fn run(self) -> Result<(), StartupError> {
        let logging = LoggingSettings::from_configuration(&self.configuration);
        if let Err(e) = observability::init_logging(&logging) {
            tracing::debug!(error = %e, "Logging already initialized");
        }
        for (key, value) in &logging.rejected {
            tracing::warn!(key = %key, value = %value, "Ignoring unknown log level");
        }

        tracing::info!(
            application = %self.environment.application_name,
            environment = %self.environment.environment_name,
            threads = self.settings.threads_number,
            "Starting application"
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(usize::from(self.settings.threads_number.max(1)))
            .enable_all()
            .build()
            .map_err(StartupError::Runtime)?;

        runtime.block_on(async move {
            let shutdown = Shutdown::new();
            tokio::spawn(listen_for_signals(shutdown.clone()));
            let result = self.serve(shutdown).await;
            tracing::info!("Shutdown complete");
            result
        })
    }
}

impl std::fmt::Debug for WebApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebApplication")
            .field("environment", &self.environment.environment_name)
            .field("settings", &self.settings)
            .field("middlewares", &self.creators.len())
            .finish()
    }
}

fn metrics_address(config: &Configuration) -> Result<Option<SocketAddr>, ConfigError> {
    let Some(raw) = config.get_str(METRICS_ADDRESS_KEY) else {
        return Ok(None);
    };
    raw.parse().map(Some).map_err(|e| {
        ConfigError::Validation(vec![ValidationError {
            field: METRICS_ADDRESS_KEY.to_string(),
            message: format!("'{}' is not a socket address: {}", raw, e),
        }])
    })
}
