use async_trait::async_trait;
use kakehashi::{
    AdapterError, Capabilities, CucumberAdapter, EventListener, Feature, HookRegistry,
    RunOptions, RunState, Scenario, ScenarioEngine, SourceLocation, Step, StepBody,
    StepDefinition, StepDefinitionFactory, StepOptions, StepResult, StepStatus, SummaryReporter,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

type EventLog = Arc<Mutex<Vec<String>>>;

fn log(events: &EventLog, entry: impl Into<String>) {
    events.lock().expect("event log lock").push(entry.into());
}

struct ScriptedStep {
    keyword: &'static str,
    text: &'static str,
    args: Vec<String>,
}

struct ScriptedScenario {
    name: &'static str,
    steps: Vec<ScriptedStep>,
}

struct ScriptedFeature {
    name: &'static str,
    uri: &'static str,
    scenarios: Vec<ScriptedScenario>,
}

struct Registration {
    pattern: &'static str,
    options: StepOptions,
    body: StepBody,
}

/// Engine double: walks a scripted feature tree, creates definitions
/// through the installed factory, emits the six lifecycle events in order,
/// and awaits every listener before moving on.
struct ScriptedEngine {
    features: Vec<ScriptedFeature>,
    registrations: Vec<Registration>,
    factory: Option<Arc<dyn StepDefinitionFactory>>,
    default_timeout: Option<Duration>,
    listeners: Vec<Arc<dyn EventListener>>,
    configured: Option<RunOptions>,
}

impl ScriptedEngine {
    fn new(features: Vec<ScriptedFeature>, registrations: Vec<Registration>) -> Self {
        Self {
            features,
            registrations,
            factory: None,
            default_timeout: None,
            listeners: Vec::new(),
            configured: None,
        }
    }

    async fn run_scenario(
        &self,
        definitions: &[StepDefinition],
        feature: &ScriptedFeature,
        scenario: &ScriptedScenario,
    ) {
        let payload = Scenario {
            name: scenario.name.to_string(),
            uri: feature.uri.to_string(),
            line: 1,
            tags: Vec::new(),
        };
        for listener in &self.listeners {
            listener.before_scenario(&payload).await;
        }

        let mut scenario_failed = false;
        for (index, step) in scenario.steps.iter().enumerate() {
            let step_payload = Step {
                keyword: step.keyword.to_string(),
                text: step.text.to_string(),
                uri: feature.uri.to_string(),
                line: index as u32 + 2,
            };
            for listener in &self.listeners {
                listener.before_step(&step_payload).await;
            }

            let (status, error) = if scenario_failed {
                (StepStatus::Skipped, None)
            } else if let Some(definition) = definitions.iter().find(|d| d.pattern == step.text) {
                match definition.runner.invoke(step.args.clone()).await {
                    Ok(()) => (StepStatus::Passed, None),
                    Err(cause) => {
                        scenario_failed = true;
                        (StepStatus::Failed, Some(cause.to_string()))
                    }
                }
            } else {
                scenario_failed = true;
                (StepStatus::Undefined, None)
            };

            let result = StepResult {
                step: step_payload.clone(),
                status,
                error,
                duration_ms: 0,
            };
            for listener in &self.listeners {
                listener.on_step_result(&result).await;
            }
        }

        for listener in &self.listeners {
            listener.after_scenario(&payload).await;
        }
    }
}

#[async_trait]
impl ScenarioEngine for ScriptedEngine {
    fn configure(&mut self, options: &RunOptions) {
        self.configured = Some(options.clone());
    }

    fn install_step_factory(&mut self, factory: Arc<dyn StepDefinitionFactory>) {
        self.factory = Some(factory);
    }

    fn remove_step_factory(&mut self) {
        self.factory = None;
    }

    fn set_default_timeout(&mut self, timeout: Duration) {
        self.default_timeout = Some(timeout);
    }

    fn clear_default_timeout(&mut self) {
        self.default_timeout = None;
    }

    fn attach_listener(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    async fn start(&mut self) -> Result<(), AdapterError> {
        let factory = self.factory.as_ref().ok_or_else(|| {
            AdapterError::EngineStartup("no step-definition factory installed".to_string())
        })?;

        let definitions: Vec<StepDefinition> = self
            .registrations
            .iter()
            .enumerate()
            .map(|(index, registration)| {
                factory.create(
                    registration.pattern,
                    registration.options.clone(),
                    registration.body.clone(),
                    SourceLocation::new("tests/steps.rs", index as u32 + 1),
                )
            })
            .collect();

        for feature in &self.features {
            let payload = Feature {
                name: feature.name.to_string(),
                uri: feature.uri.to_string(),
            };
            for listener in &self.listeners {
                listener.before_feature(&payload).await;
            }
            for scenario in &feature.scenarios {
                self.run_scenario(&definitions, feature, scenario).await;
            }
            for listener in &self.listeners {
                listener.after_feature(&payload).await;
            }
        }
        Ok(())
    }
}

fn capabilities() -> Capabilities {
    serde_json::json!({ "browserName": "chrome" })
}

fn recording_hooks(events: &EventLog) -> HookRegistry {
    let on_before_run = Arc::clone(events);
    let on_before_feature = Arc::clone(events);
    let on_after_feature = Arc::clone(events);
    let on_before_scenario = Arc::clone(events);
    let on_after_scenario = Arc::clone(events);
    let on_before_step = Arc::clone(events);
    let on_after_step = Arc::clone(events);
    let on_after_run = Arc::clone(events);

    HookRegistry::builder()
        .before_run(move |_suite| {
            log(&on_before_run, "beforeRun");
            async move { Ok(()) }
        })
        .before_feature(move |_f| {
            log(&on_before_feature, "beforeFeature");
            async move { Ok(()) }
        })
        .after_feature(move |_f| {
            log(&on_after_feature, "afterFeature");
            async move { Ok(()) }
        })
        .before_scenario(move |_s| {
            log(&on_before_scenario, "beforeScenario");
            async move { Ok(()) }
        })
        .after_scenario(move |_s| {
            log(&on_after_scenario, "afterScenario");
            async move { Ok(()) }
        })
        .before_step(move |_s| {
            log(&on_before_step, "beforeStep");
            async move { Ok(()) }
        })
        .after_step(move |result| {
            log(&on_after_step, format!("afterStep:{:?}", result.status));
            async move { Ok(()) }
        })
        .after_run(move |outcome| {
            log(&on_after_run, format!("afterRun:{}", outcome.failed));
            async move { Ok(()) }
        })
        .build()
}

fn adapter_for(
    engine: ScriptedEngine,
    hooks: HookRegistry,
) -> CucumberAdapter<ScriptedEngine, SummaryReporter> {
    let options = RunOptions::default();
    let reporter = Arc::new(SummaryReporter::new(&kakehashi::ReporterConfig {
        capabilities: capabilities(),
        ignore_undefined_definitions: options.ignore_undefined_definitions,
    }));
    CucumberAdapter::new(
        "0-0",
        engine,
        options,
        vec!["features/login.feature".to_string()],
        capabilities(),
        hooks,
        reporter,
    )
}

fn login_feature(steps: Vec<ScriptedStep>) -> Vec<ScriptedFeature> {
    vec![ScriptedFeature {
        name: "Login",
        uri: "features/login.feature",
        scenarios: vec![ScriptedScenario {
            name: "user logs in",
            steps,
        }],
    }]
}

#[tokio::test]
async fn test_full_run_with_flaky_step_passes_and_keeps_event_order() {
    init_tracing();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let flaky_calls = Arc::new(AtomicU32::new(0));

    let open_log = Arc::clone(&events);
    let flaky_log = Arc::clone(&events);
    let flaky_counter = Arc::clone(&flaky_calls);
    let registrations = vec![
        Registration {
            pattern: "I open the login page",
            options: StepOptions::default(),
            body: StepBody::blocking(move |_args: &[String]| {
                log(&open_log, "body:open");
                Ok(())
            }),
        },
        Registration {
            pattern: "I submit valid credentials",
            options: StepOptions {
                retry: Some("2".to_string()),
                timeout: None,
            },
            body: StepBody::explicit(move |_args| {
                let events = Arc::clone(&flaky_log);
                let calls = Arc::clone(&flaky_counter);
                async move {
                    log(&events, "body:submit");
                    let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt < 3 {
                        Err(AdapterError::StepFailed {
                            pattern: "I submit valid credentials".to_string(),
                            details: "session not ready".to_string(),
                        })
                    } else {
                        Ok(())
                    }
                }
            }),
        },
    ];

    let engine = ScriptedEngine::new(
        login_feature(vec![
            ScriptedStep {
                keyword: "Given",
                text: "I open the login page",
                args: Vec::new(),
            },
            ScriptedStep {
                keyword: "When",
                text: "I submit valid credentials",
                args: Vec::new(),
            },
        ]),
        registrations,
    );

    let mut adapter = adapter_for(engine, recording_hooks(&events));
    let failed = adapter.run().await.expect("run succeeds");

    assert_eq!(failed, 0);
    assert_eq!(flaky_calls.load(Ordering::SeqCst), 3);
    assert_eq!(adapter.state(), RunState::Completed);

    let recorded = events.lock().expect("event log lock").clone();
    assert_eq!(
        recorded,
        vec![
            "beforeRun",
            "beforeFeature",
            "beforeScenario",
            "beforeStep",
            "body:open",
            "afterStep:Passed",
            "beforeStep",
            "body:submit",
            "body:submit",
            "body:submit",
            "afterStep:Passed",
            "afterScenario",
            "afterFeature",
            "afterRun:0",
        ]
    );
}

#[tokio::test]
async fn test_failing_step_is_counted_and_later_steps_skip() {
    init_tracing();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let later_calls = Arc::new(AtomicU32::new(0));
    let later_counter = Arc::clone(&later_calls);

    let registrations = vec![
        Registration {
            pattern: "I submit wrong credentials",
            options: StepOptions::default(),
            body: StepBody::blocking(|_args: &[String]| {
                Err(AdapterError::StepFailed {
                    pattern: "I submit wrong credentials".to_string(),
                    details: "assertion failed: logged_in".to_string(),
                })
            }),
        },
        Registration {
            pattern: "I see the dashboard",
            options: StepOptions::default(),
            body: StepBody::blocking(move |_args: &[String]| {
                later_counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        },
    ];

    let engine = ScriptedEngine::new(
        login_feature(vec![
            ScriptedStep {
                keyword: "When",
                text: "I submit wrong credentials",
                args: Vec::new(),
            },
            ScriptedStep {
                keyword: "Then",
                text: "I see the dashboard",
                args: Vec::new(),
            },
        ]),
        registrations,
    );

    let mut adapter = adapter_for(engine, recording_hooks(&events));
    let failed = adapter.run().await.expect("run completes");

    assert_eq!(failed, 1);
    assert_eq!(later_calls.load(Ordering::SeqCst), 0, "skipped step not run");

    let recorded = events.lock().expect("event log lock").clone();
    assert!(recorded.contains(&"afterStep:Failed".to_string()));
    assert!(recorded.contains(&"afterStep:Skipped".to_string()));
    assert!(recorded.contains(&"afterScenario".to_string()));
    assert!(recorded.contains(&"afterFeature".to_string()));
    assert_eq!(recorded.last().map(String::as_str), Some("afterRun:1"));
}

#[tokio::test]
async fn test_failing_before_scenario_hook_does_not_abort_scenario() {
    init_tracing();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let body_calls = Arc::new(AtomicU32::new(0));
    let body_counter = Arc::clone(&body_calls);
    let after_scenario_log = Arc::clone(&events);

    let hooks = HookRegistry::builder()
        .before_scenario(|_s| async move { Err(AdapterError::Configuration("boom".to_string())) })
        .after_scenario(move |_s| {
            log(&after_scenario_log, "afterScenario");
            async move { Ok(()) }
        })
        .build();

    let engine = ScriptedEngine::new(
        login_feature(vec![ScriptedStep {
            keyword: "Given",
            text: "I open the login page",
            args: Vec::new(),
        }]),
        vec![Registration {
            pattern: "I open the login page",
            options: StepOptions::default(),
            body: StepBody::blocking(move |_args: &[String]| {
                body_counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        }],
    );

    let mut adapter = adapter_for(engine, hooks);
    let failed = adapter.run().await.expect("run completes");

    assert_eq!(failed, 0, "hook failure never alters the failed count");
    assert_eq!(body_calls.load(Ordering::SeqCst), 1, "steps still execute");
    assert_eq!(
        *events.lock().expect("event log lock"),
        vec!["afterScenario"],
        "later hooks still run"
    );
}

#[tokio::test]
async fn test_after_run_hook_receives_actual_outcome() {
    init_tracing();
    let seen: Arc<Mutex<Option<(u32, Capabilities, Vec<String>)>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    let hooks = HookRegistry::builder()
        .after_run(move |outcome| {
            *sink.lock().expect("outcome lock") = Some((
                outcome.failed,
                outcome.capabilities.clone(),
                outcome.specs.clone(),
            ));
            async move { Ok(()) }
        })
        .build();

    let engine = ScriptedEngine::new(
        login_feature(vec![ScriptedStep {
            keyword: "When",
            text: "I submit wrong credentials",
            args: Vec::new(),
        }]),
        vec![Registration {
            pattern: "I submit wrong credentials",
            options: StepOptions::default(),
            body: StepBody::blocking(|_args: &[String]| {
                Err(AdapterError::StepFailed {
                    pattern: "I submit wrong credentials".to_string(),
                    details: "bad password".to_string(),
                })
            }),
        }],
    );

    let mut adapter = adapter_for(engine, hooks);
    let failed = adapter.run().await.expect("run completes");
    assert_eq!(failed, 1);

    let outcome = seen.lock().expect("outcome lock").clone();
    let (hook_failed, hook_caps, hook_specs) = outcome.expect("after_run hook ran");
    assert_eq!(hook_failed, 1);
    assert_eq!(hook_caps["browserName"], "chrome");
    assert_eq!(hook_specs, vec!["features/login.feature".to_string()]);
}

#[tokio::test]
async fn test_undefined_step_counts_as_failure() {
    init_tracing();
    let engine = ScriptedEngine::new(
        login_feature(vec![ScriptedStep {
            keyword: "Given",
            text: "I do something nobody defined",
            args: Vec::new(),
        }]),
        Vec::new(),
    );

    let mut adapter = adapter_for(engine, HookRegistry::builder().build());
    let failed = adapter.run().await.expect("run completes");
    assert_eq!(failed, 1);
}

#[tokio::test]
async fn test_engine_overrides_are_restored_after_run() {
    init_tracing();
    let engine = ScriptedEngine::new(Vec::new(), Vec::new());
    let mut adapter = adapter_for(engine, HookRegistry::builder().build());

    adapter.run().await.expect("run completes");

    let engine = adapter.engine();
    assert!(engine.factory.is_none(), "step factory removed");
    assert!(engine.default_timeout.is_none(), "timeout override cleared");
    assert_eq!(
        engine.configured.as_ref().map(|options| options.timeout_ms),
        Some(30_000)
    );
}

#[tokio::test]
async fn test_matched_args_reach_the_body_unchanged() {
    init_tracing();
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let engine = ScriptedEngine::new(
        login_feature(vec![ScriptedStep {
            keyword: "When",
            text: "I type my name",
            args: vec!["Alice".to_string(), "Cooper".to_string()],
        }]),
        vec![Registration {
            pattern: "I type my name",
            options: StepOptions::default(),
            body: StepBody::blocking(move |args: &[String]| {
                sink.lock().expect("args lock").extend(args.iter().cloned());
                Ok(())
            }),
        }],
    );

    let mut adapter = adapter_for(engine, HookRegistry::builder().build());
    adapter.run().await.expect("run completes");

    assert_eq!(
        *seen.lock().expect("args lock"),
        vec!["Alice".to_string(), "Cooper".to_string()]
    );
}
