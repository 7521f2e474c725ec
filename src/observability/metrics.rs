use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub plans_total: IntCounterVec,
    pub plan_latency_seconds: HistogramVec,
    pub routing_fallbacks_total: IntCounter,
    pub allocated_units_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let plans_total = IntCounterVec::new(
            Opts::new("donation_plans_total", "Donation plans by outcome"),
            &["outcome"],
        )
        .expect("valid donation_plans_total metric");

        let plan_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "donation_plan_latency_seconds",
                "Latency of donation plan computation in seconds",
            ),
            &["outcome"],
        )
        .expect("valid donation_plan_latency_seconds metric");

        let routing_fallbacks_total = IntCounter::new(
            "routing_fallbacks_total",
            "Plans computed in routing-fallback mode (durations unknown)",
        )
        .expect("valid routing_fallbacks_total metric");

        let allocated_units_total = IntCounter::new(
            "allocated_units_total",
            "Total units allocated to food banks across committed plans",
        )
        .expect("valid allocated_units_total metric");

        registry
            .register(Box::new(plans_total.clone()))
            .expect("register donation_plans_total");
        registry
            .register(Box::new(plan_latency_seconds.clone()))
            .expect("register donation_plan_latency_seconds");
        registry
            .register(Box::new(routing_fallbacks_total.clone()))
            .expect("register routing_fallbacks_total");
        registry
            .register(Box::new(allocated_units_total.clone()))
            .expect("register allocated_units_total");

        Self {
            registry,
            plans_total,
            plan_latency_seconds,
            routing_fallbacks_total,
            allocated_units_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
