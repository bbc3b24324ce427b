mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use herald_core::{
    ChannelContext, LogLevel, MemorySettings, Permission, SettingScope, SettingStore,
};
use herald_framework::{
    ArgSpec, ArgValue, Arguments, BoxError, CommandDescriptor, DispatchError, GuardDenial,
    Intent, InvocationContext, Middleware, Outcome,
};

use common::{
    Harness, StalledResponder, StalledSettings, admin, guild_channel, member, moderator,
};

type Seen = Arc<Mutex<Vec<Vec<ArgValue>>>>;

/// An action recording the arguments it receives.
fn recorder() -> (
    Seen,
    impl Fn(Arc<InvocationContext>, Arguments) -> futures::future::Ready<()> + Send + Sync + 'static,
) {
    let seen: Seen = Arc::default();
    let sink = seen.clone();
    let action = move |_ctx: Arc<InvocationContext>, args: Arguments| {
        sink.lock().push(args.into_inner());
        futures::future::ready(())
    };
    (seen, action)
}

#[tokio::test]
async fn resolves_declared_arguments() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("give")
                .argument(ArgSpec::required("name", "String"))
                .argument(ArgSpec::required("count", "Number"))
                .resolve()
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher
        .handle_incoming("!give alice 5", member(), guild_channel())
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        seen.lock().as_slice(),
        [vec![ArgValue::from("alice"), ArgValue::Number(5.0)]]
    );

    let outcome = dispatcher
        .handle_incoming("!give alice five", member(), guild_channel())
        .await;
    match outcome.error() {
        Some(DispatchError::ResolutionFailed { argument, usage, .. }) => {
            assert_eq!(argument, "count");
            assert_eq!(usage, "!give <name> <count>");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(seen.lock().len(), 1);
    let reply = harness.responder.last().unwrap();
    assert!(reply.starts_with("Invalid value for `count`"));
}

#[tokio::test]
async fn quoted_tokens_and_usage_errors() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("clear")
                .arguments("<role>: String, <when>: String")
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher
        .handle_incoming(r#"!clear    "my role" now"#, member(), guild_channel())
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        seen.lock()[0],
        vec![ArgValue::from("my role"), ArgValue::from("now")]
    );

    let outcome = dispatcher
        .handle_incoming(r#"!clear "my role""#, member(), guild_channel())
        .await;
    match outcome.error() {
        Some(DispatchError::UsageError { detail, usage }) => {
            assert!(detail.contains("at least 2"));
            assert_eq!(usage, "!clear <role> <when>");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn aliases_and_case_match() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("ping").alias("p").build().unwrap(),
            action,
        )
        .unwrap();

    for text in ["!ping", "!PING", "!p", "  !p extra"] {
        assert!(
            dispatcher
                .handle_incoming(text, member(), guild_channel())
                .await
                .is_completed(),
            "text: {text:?}"
        );
    }
    assert_eq!(seen.lock().len(), 4);

    for text in ["ping", "!", "!pong", "?ping"] {
        assert_eq!(
            dispatcher.handle_incoming(text, member(), guild_channel()).await,
            Outcome::Ignored,
            "text: {text:?}"
        );
    }
    // misses are never reported
    assert!(harness.responder.texts().is_empty());
}

#[tokio::test]
async fn guild_prefix_and_direct_messages() {
    let settings = MemorySettings::new().with(
        SettingScope::Guild("g1".into()),
        "prefix",
        json!("?"),
    );
    let harness = Harness::with_settings(settings);
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(CommandDescriptor::builder("ping").build().unwrap(), action)
        .unwrap();

    assert!(dispatcher.handle_incoming("?ping", member(), guild_channel()).await.is_completed());
    assert!(dispatcher.handle_incoming("!ping", member(), guild_channel()).await.is_ignored());

    // other guilds keep the default
    let elsewhere = ChannelContext::guild("g2", "c9");
    assert!(dispatcher.handle_incoming("!ping", member(), elsewhere).await.is_completed());

    // the prefix is optional in direct messages
    let dm = ChannelContext::direct("dm1");
    assert!(dispatcher.handle_incoming("ping", member(), dm.clone()).await.is_completed());
    assert!(dispatcher.handle_incoming("!ping", member(), dm).await.is_completed());
    assert_eq!(seen.lock().len(), 4);
}

#[tokio::test]
async fn guards_deny_without_consuming_slots() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("kick")
                .guild_only()
                .permission(Permission::KickMembers)
                .ratelimit("1/1m")
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher.handle_incoming("!kick", member(), guild_channel()).await;
    assert_eq!(
        outcome.error(),
        Some(&DispatchError::GuardDenied(GuardDenial::MissingPermissions(vec![
            Permission::KickMembers
        ])))
    );
    let outcome = dispatcher
        .handle_incoming("!kick", moderator(), ChannelContext::direct("dm"))
        .await;
    assert_eq!(outcome.error(), Some(&DispatchError::GuardDenied(GuardDenial::GuildOnly)));

    // denials recorded nothing
    assert!(dispatcher.limiter().is_empty());
    assert!(dispatcher.handle_incoming("!kick", moderator(), guild_channel()).await.is_completed());
    assert!(matches!(
        dispatcher.handle_incoming("!kick", moderator(), guild_channel()).await.error(),
        Some(DispatchError::RateLimited { .. })
    ));
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn owner_only_and_owner_bypass() {
    let settings = MemorySettings::new().with(
        SettingScope::Guild("g1".into()),
        "limitedCommands",
        json!({ "purge": ["r-admin"] }),
    );
    let harness = Harness::with_settings(settings);
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(CommandDescriptor::builder("eval").owner_only().build().unwrap(), |_ctx: Arc<InvocationContext>, _args: Arguments| async {})
        .unwrap();
    dispatcher
        .register(
            CommandDescriptor::builder("purge")
                .permission(Permission::ManageMessages)
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher.handle_incoming("!eval", moderator(), guild_channel()).await;
    assert_eq!(outcome.error(), Some(&DispatchError::GuardDenied(GuardDenial::OwnerOnly)));
    assert_eq!(
        harness.responder.last().as_deref(),
        Some("This command can only be used by the bot owners.")
    );

    let owner = herald_core::Actor::new("owner", "root");
    assert!(dispatcher.handle_incoming("!eval", owner.clone(), guild_channel()).await.is_completed());
    // owners skip permission and role checks
    assert!(dispatcher.handle_incoming("!purge", owner, guild_channel()).await.is_completed());

    assert!(matches!(
        dispatcher.handle_incoming("!purge", admin(), guild_channel()).await.error(),
        Some(DispatchError::GuardDenied(GuardDenial::RoleLimited(_)))
    ));
    let with_role = admin().with_roles(["r-admin"]);
    assert!(dispatcher.handle_incoming("!purge", with_role, guild_channel()).await.is_completed());
    assert_eq!(seen.lock().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_window() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("roll").ratelimit("2/10s").build().unwrap(),
            action,
        )
        .unwrap();

    assert!(dispatcher.handle_incoming("!roll", member(), guild_channel()).await.is_completed());
    assert!(dispatcher.handle_incoming("!roll", member(), guild_channel()).await.is_completed());

    match dispatcher.handle_incoming("!roll", member(), guild_channel()).await.error() {
        Some(DispatchError::RateLimited { retry_after }) => {
            assert!(*retry_after > Duration::ZERO);
            assert!(*retry_after <= Duration::from_secs(10));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        harness.responder.last().as_deref(),
        Some("You are using `roll` too quickly. Try again in 10s.")
    );

    // another actor has its own window
    assert!(dispatcher.handle_incoming("!roll", moderator(), guild_channel()).await.is_completed());

    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(dispatcher.handle_incoming("!roll", member(), guild_channel()).await.is_completed());
    assert_eq!(seen.lock().len(), 4);
}

struct CountingValidator(Arc<AtomicUsize>);

#[async_trait]
impl Middleware for CountingValidator {
    fn name(&self) -> &str {
        "count-validate"
    }

    fn intent(&self) -> Intent {
        Intent::Validate
    }

    async fn call(
        &self,
        _ctx: &InvocationContext,
        args: Arguments,
    ) -> Result<Arguments, DispatchError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(args)
    }
}

#[tokio::test]
async fn failed_resolution_skips_later_middleware() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let validated = Arc::new(AtomicUsize::new(0));
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("wait")
                .arguments("<for>: Duration")
                .resolve()
                .using(CountingValidator(validated.clone()))
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher.handle_incoming("!wait soon", member(), guild_channel()).await;
    assert!(matches!(outcome.error(), Some(DispatchError::ResolutionFailed { .. })));
    assert_eq!(validated.load(Ordering::SeqCst), 0);

    assert!(dispatcher.handle_incoming("!wait 1h30m", member(), guild_channel()).await.is_completed());
    assert_eq!(validated.load(Ordering::SeqCst), 1);
    assert_eq!(
        seen.lock()[0],
        vec![ArgValue::Duration(Duration::from_secs(5_400))]
    );
}

#[tokio::test]
async fn reference_and_choice_arguments() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("punish")
                .arguments("<who>: Member, <mode>: ['ban', 'kick'], [...reason]: String")
                .resolve()
                .expect()
                .localize()
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher
        .handle_incoming("!punish <@!100> KICK being rude", member(), guild_channel())
        .await;
    assert!(outcome.is_completed());
    let args = seen.lock()[0].clone();
    assert_eq!(args.len(), 4);
    assert!(matches!(&args[0], ArgValue::Resource(r) if r.lang() == "en"));
    assert_eq!(args[1].as_member().map(|m| m.user.name.as_str()), Some("alice"));
    assert_eq!(args[2], ArgValue::Choice("kick".into()));
    assert_eq!(args[3], ArgValue::from("being rude"));

    let outcome = dispatcher
        .handle_incoming("!punish bob ban", member(), guild_channel())
        .await;
    match outcome.error() {
        Some(DispatchError::ResolutionFailed { argument, reason, .. }) => {
            assert_eq!(argument, "who");
            assert_eq!(reason, "no such member: `bob`");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // the optional remainder may be left out
    assert!(dispatcher.handle_incoming("!punish alice ban", member(), guild_channel()).await.is_completed());
    assert_eq!(seen.lock()[1][3], ArgValue::Absent);
}

#[tokio::test]
async fn guild_language_reaches_localize() {
    let settings = MemorySettings::new().with(
        SettingScope::Guild("g1".into()),
        "lang",
        json!("fr"),
    );
    let harness = Harness::with_settings(settings);
    let mut dispatcher = harness.builder().default_lang("de").build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(CommandDescriptor::builder("hello").localize().build().unwrap(), action)
        .unwrap();

    dispatcher.handle_incoming("!hello", member(), guild_channel()).await;
    dispatcher.handle_incoming("!hello", member(), ChannelContext::direct("dm")).await;
    let langs: Vec<String> = seen
        .lock()
        .iter()
        .map(|args| args[0].as_resources().map(|r| r.lang().to_string()).unwrap_or_default())
        .collect();
    assert_eq!(langs, ["fr", "de"]);
}

#[tokio::test]
async fn map_middleware_rejects() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("half")
                .arguments("<n>: Number")
                .resolve()
                .map("even", |args| match args[0].as_number() {
                    Some(n) if n % 2.0 == 0.0 => Ok(args),
                    _ => Err("the number must be even".to_string()),
                })
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher.handle_incoming("!half 3", member(), guild_channel()).await;
    assert_eq!(
        outcome.error(),
        Some(&DispatchError::rejected("even", "the number must be even"))
    );
    assert_eq!(harness.responder.last().as_deref(), Some("the number must be even"));
    assert!(dispatcher.handle_incoming("!half 4", member(), guild_channel()).await.is_completed());
    assert_eq!(seen.lock().len(), 1);
}

async fn out_of_bounds(_ctx: Arc<InvocationContext>, _args: Arguments) {
    panic!("index out of bounds");
}

#[tokio::test]
async fn failing_action_is_contained() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("explode").ratelimit("2/1m").build().unwrap(),
            |_ctx: Arc<InvocationContext>, _args: Arguments| async {
                Err::<(), BoxError>("database unreachable".into())
            },
        )
        .unwrap();
    dispatcher
        .register(
            CommandDescriptor::builder("panic").build().unwrap(),
            out_of_bounds,
        )
        .unwrap();
    dispatcher
        .register(CommandDescriptor::builder("ping").ratelimit("2/1m").build().unwrap(), action)
        .unwrap();

    let outcome = dispatcher.handle_incoming("!explode now", member(), guild_channel()).await;
    match &outcome {
        Outcome::Failed { error, reply, .. } => {
            assert_eq!(
                error,
                &DispatchError::InternalActionError("database unreachable".into())
            );
            let reply = reply.as_deref().unwrap();
            assert!(!reply.contains("database"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let lines = harness.log.lines.lock().clone();
    assert_eq!(lines.len(), 1);
    let (level, tag, text) = &lines[0];
    assert_eq!(*level, LogLevel::Error);
    assert_eq!(tag, "Command:explode");
    assert!(text.contains("database unreachable"));
    assert!(text.contains("!explode now"));

    // the failed call still used its slot; other commands are untouched
    assert!(matches!(
        dispatcher.handle_incoming("!explode", member(), guild_channel()).await.error(),
        Some(DispatchError::InternalActionError(_))
    ));
    assert!(matches!(
        dispatcher.handle_incoming("!explode", member(), guild_channel()).await.error(),
        Some(DispatchError::RateLimited { .. })
    ));
    assert!(dispatcher.handle_incoming("!ping", member(), guild_channel()).await.is_completed());

    let outcome = dispatcher.handle_incoming("!panic", member(), guild_channel()).await;
    match outcome.error() {
        Some(DispatchError::InternalActionError(cause)) => {
            assert!(cause.contains("index out of bounds"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(dispatcher.handle_incoming("!ping", member(), guild_channel()).await.is_completed());
    assert_eq!(seen.lock().len(), 2);
}

#[tokio::test]
async fn replies_can_be_disabled() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().reply_errors(false).build().unwrap();
    dispatcher
        .register(
            CommandDescriptor::builder("need").arguments("<x>").build().unwrap(),
            |_ctx: Arc<InvocationContext>, _args: Arguments| async {},
        )
        .unwrap();

    match dispatcher.handle_incoming("!need", member(), guild_channel()).await {
        Outcome::Failed { reply, .. } => assert!(reply.is_some()),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(harness.responder.texts().is_empty());
}

#[tokio::test]
async fn string_results_are_sent_back() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    dispatcher
        .register(
            CommandDescriptor::builder("echo")
                .arguments("<...text>")
                .build()
                .unwrap(),
            |_ctx: Arc<InvocationContext>, args: Arguments| async move {
                Ok::<_, BoxError>(format!("you said: {}", args[0]))
            },
        )
        .unwrap();

    assert!(dispatcher.handle_incoming("!echo  hello   there ", member(), guild_channel()).await.is_completed());
    assert_eq!(harness.responder.texts(), ["you said: hello   there"]);
}

#[tokio::test(start_paused = true)]
async fn stalled_settings_fall_back_to_defaults() {
    let harness = Harness::new();
    let mut dispatcher = harness
        .builder()
        .settings(Arc::new(StalledSettings))
        .lookup_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    dispatcher
        .register(
            CommandDescriptor::builder("ping").build().unwrap(),
            |_ctx: Arc<InvocationContext>, _args: Arguments| async { "pong" },
        )
        .unwrap();

    // prefix, language and role limits each wait out the timeout
    let outcome = tokio::time::timeout(
        Duration::from_secs(60),
        dispatcher.handle_incoming("!ping", member(), guild_channel()),
    )
    .await
    .expect("dispatch finished");

    assert!(outcome.is_completed());
    assert_eq!(harness.responder.texts(), ["pong"]);
}

#[tokio::test(start_paused = true)]
async fn stalled_replies_still_return_the_failure() {
    let harness = Harness::new();
    let mut dispatcher = harness
        .builder()
        .responder(Arc::new(StalledResponder))
        .lookup_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("give")
                .arguments("<name>: String")
                .build()
                .unwrap(),
            action,
        )
        .unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_secs(60),
        dispatcher.handle_incoming("!give", member(), guild_channel()),
    )
    .await
    .expect("dispatch finished");

    assert!(matches!(outcome.error(), Some(DispatchError::UsageError { .. })));
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn limit_and_clearlimit_manage_role_limits() {
    let harness = Harness::new();
    let mut dispatcher = harness.builder().build().unwrap();
    dispatcher.register_limit_commands().unwrap();
    let (seen, action) = recorder();
    dispatcher
        .register(
            CommandDescriptor::builder("kick").alias("boot").build().unwrap(),
            action,
        )
        .unwrap();

    let outcome = dispatcher
        .handle_incoming("!limit nope my role", admin(), guild_channel())
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        harness.responder.last().as_deref(),
        Some("There is no command named `nope`.")
    );

    // aliases name the command they belong to
    let outcome = dispatcher
        .handle_incoming("!limit BOOT my role", admin(), guild_channel())
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        harness.responder.last().as_deref(),
        Some("`kick` is now limited to: my role")
    );
    let stored = harness
        .settings
        .get(&SettingScope::Guild("g1".into()), "limitedCommands")
        .await
        .unwrap();
    assert_eq!(stored, Some(json!({ "kick": ["200"] })));

    assert!(matches!(
        dispatcher.handle_incoming("!kick", member(), guild_channel()).await.error(),
        Some(DispatchError::GuardDenied(GuardDenial::RoleLimited(_)))
    ));
    let holder = member().with_roles(["200"]);
    assert!(dispatcher.handle_incoming("!kick", holder, guild_channel()).await.is_completed());

    // managing limits takes Administrator
    assert!(matches!(
        dispatcher.handle_incoming("!clearlimit kick", moderator(), guild_channel()).await.error(),
        Some(DispatchError::GuardDenied(GuardDenial::MissingPermissions(_)))
    ));

    let outcome = dispatcher
        .handle_incoming("!clearlimit kick", admin(), guild_channel())
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        harness.responder.last().as_deref(),
        Some("Removed role limits from `kick`.")
    );
    assert!(dispatcher.handle_incoming("!kick", member(), guild_channel()).await.is_completed());
    assert_eq!(seen.lock().len(), 2);
}
