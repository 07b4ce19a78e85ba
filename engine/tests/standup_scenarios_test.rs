//! End-to-end standup scenarios through the supervisor
//!
//! Drives `Supervisor::handle_event` with a table-backed directory and checks
//! both the replies and the registry state after each message.

use huddle_engine::config::BotSettings;
use huddle_engine::daemon::SupervisorStats;
use huddle_engine::lang;
use huddle_engine::session::{Outbox, SessionStore, Supervisor};
use huddle_engine::standup::{Category, Updates};
use huddle_engine::testing::FakeDirectory;
use sdk::types::{BotIdentity, InboundEvent};

struct Harness {
    supervisor: Supervisor,
    directory: FakeDirectory,
    stats: SupervisorStats,
}

impl Harness {
    fn new(settings: BotSettings) -> Self {
        let mut supervisor = Supervisor::new(settings);
        supervisor.set_identity(BotIdentity {
            id: "UBOT".to_string(),
            name: "huddle".to_string(),
        });
        let directory = FakeDirectory::new()
            .with_channel("C1", "dev", &["UBOT", "U1", "U2"])
            .with_user("U1", "ann")
            .with_user("U2", "bob");
        Self {
            supervisor,
            directory,
            stats: SupervisorStats::new(),
        }
    }

    async fn send(&mut self, destination: &str, author: &str, text: &str) -> Outbox {
        let event = InboundEvent::message(destination, author, text, 0.0);
        self.supervisor
            .handle_event(&event, &self.directory, &self.stats)
            .await
            .unwrap()
    }

    fn outstanding(&self) -> Option<usize> {
        self.supervisor
            .store()
            .standup("C1")
            .map(|standup| standup.outstanding())
    }

    fn updates(&self, user_id: &str) -> Updates {
        self.supervisor
            .store()
            .standup("C1")
            .and_then(|standup| standup.updates(user_id))
            .cloned()
            .unwrap()
    }
}

fn is_report(text: &str) -> bool {
    text.starts_with("*Standup for dev*")
}

#[tokio::test]
async fn test_start_enrolls_every_member() {
    let mut h = Harness::new(BotSettings::default());

    let outbox = h.send("C1", "U1", "<@UBOT> start").await;

    assert_eq!(outbox.to("C1"), vec!["Okay, dev standup started."]);
    assert_eq!(outbox.to("DU1").len(), 1);
    assert!(outbox.to("DU1")[0].contains("dev"));
    assert_eq!(outbox.to("DU2").len(), 1);
    assert_eq!(h.outstanding(), Some(2));
    assert_eq!(h.supervisor.store().user_count(), 2);
}

#[tokio::test]
async fn test_status_entry_is_recorded_and_acknowledged() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;

    let outbox = h.send("DU1", "U1", "d: wrote code").await;

    assert_eq!(
        outbox.to("DU1"),
        vec!["Ok; channel:dev, done:1, blocked:0, goals:0"]
    );
    assert_eq!(h.updates("U1").entries(Category::Done), ["wrote code"]);
}

#[tokio::test]
async fn test_full_standup_publishes_once_and_unlinks() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;
    h.send("DU1", "U1", "d: wrote code").await;

    let outbox = h.send("DU1", "U1", "end").await;
    assert_eq!(outbox.to("C1"), vec!["<@U1> sat down."]);
    assert_eq!(h.outstanding(), Some(1));
    assert!(h.supervisor.store().user("U1").is_none());
    assert!(h.supervisor.store().conversation("DU1").is_none());

    let outbox = h.send("DU2", "U2", "end").await;
    let channel = outbox.to("C1");
    assert_eq!(channel[0], "<@U2> sat down.");
    assert_eq!(channel.iter().filter(|t| is_report(t)).count(), 1);

    let report = channel[1];
    assert!(report.contains("<@U1>:```"));
    assert!(report.contains("* wrote code"));
    assert!(report.contains("<@U2>: *None*"));
    assert!(report.find("<@U1>").unwrap() < report.find("<@U2>").unwrap());

    // The report goes out before the last user is released
    assert_eq!(
        outbox.to("DU2"),
        vec![
            "Thanks; channel:dev, done:0, blocked:0, goals:0",
            "*dev standup ended!*",
        ]
    );
    assert!(outbox.to("DU1").is_empty());
    assert_eq!(h.supervisor.store().standup_count(), 0);
    assert_eq!(h.supervisor.store().user_count(), 0);
}

#[tokio::test]
async fn test_outstanding_never_increases_after_start() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;

    let mut last = h.outstanding().unwrap();
    let script = [
        ("DU1", "U1", "g: ship it"),
        ("DU2", "U2", "b: flaky ci"),
        ("DU2", "U2", "show"),
        ("DU1", "U1", "skip"),
        ("C1", "U2", "<@UBOT> add"),
        ("DU2", "U2", "reset blocked"),
    ];
    for (destination, author, text) in script {
        h.send(destination, author, text).await;
        let now = h.outstanding().unwrap();
        assert!(now <= last, "{} raised outstanding", text);
        last = now;
    }
    assert_eq!(last, 1);
}

#[tokio::test]
async fn test_join_twice_reports_already_in() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;

    let outbox = h.send("C1", "U1", "<@UBOT> join").await;

    assert_eq!(
        outbox.to("C1"),
        vec!["<@U1> is already in the dev standup."]
    );
    assert!(outbox.to("DU1").is_empty());
    assert_eq!(h.outstanding(), Some(2));
}

#[tokio::test]
async fn test_join_after_finishing_reenrolls() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;
    h.send("DU1", "U1", "end").await;
    assert_eq!(h.outstanding(), Some(1));

    let outbox = h.send("C1", "U1", "<@UBOT> join").await;

    assert_eq!(outbox.to("C1"), vec!["<@U1> joined the dev standup."]);
    assert_eq!(outbox.to("DU1").len(), 1);
    assert_eq!(h.outstanding(), Some(2));
}

#[tokio::test]
async fn test_join_without_standup_starts_one_for_the_author() {
    let mut h = Harness::new(BotSettings::default());

    let outbox = h.send("C1", "U2", "<@UBOT> join").await;

    assert_eq!(outbox.to("C1"), vec!["Okay, dev standup started."]);
    assert_eq!(h.outstanding(), Some(1));
    assert!(h.supervisor.store().user("U1").is_none());
}

#[tokio::test]
async fn test_reset_one_category_leaves_others_alone() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;
    h.send("DU1", "U1", "d: wrote code").await;
    h.send("DU1", "U1", "b: waiting on review").await;
    h.send("DU1", "U1", "g: merge it").await;

    let outbox = h.send("DU1", "U1", "reset goals").await;
    assert_eq!(
        outbox.to("DU1"),
        vec!["Ok; channel:dev, done:1, blocked:1, goals:0"]
    );
    let updates = h.updates("U1");
    assert_eq!(updates.entries(Category::Done), ["wrote code"]);
    assert_eq!(updates.entries(Category::Blocked), ["waiting on review"]);
    assert!(updates.entries(Category::Goals).is_empty());

    h.send("DU1", "U1", "reset").await;
    assert!(h.updates("U1").is_empty());
}

#[tokio::test]
async fn test_show_and_uptime_do_not_mutate() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;
    h.send("DU1", "U1", "d: wrote code").await;

    let standup_before = h.supervisor.store().standup("C1").cloned().unwrap();
    let user_before = h.supervisor.store().user("U1").cloned();

    let outbox = h.send("DU1", "U1", "show").await;
    assert_eq!(outbox.to("DU1").len(), 2);
    let outbox = h.send("C1", "U2", "<@UBOT> uptime").await;
    assert!(outbox.to("C1")[0].contains("standups"));

    let standup_after = h.supervisor.store().standup("C1").unwrap();
    assert_eq!(standup_after.outstanding(), standup_before.outstanding());
    assert_eq!(standup_after.users(), standup_before.users());
    for user_id in standup_before.users() {
        assert_eq!(
            standup_after.updates(user_id),
            standup_before.updates(user_id)
        );
    }
    assert_eq!(h.supervisor.store().user("U1").cloned(), user_before);
    assert_eq!(h.supervisor.store().standup_count(), 1);
}

#[tokio::test]
async fn test_ignore_list_skips_named_members() {
    let settings = BotSettings::default().with_ignore("dev", ["bob"]);
    let mut h = Harness::new(settings);

    let outbox = h.send("C1", "U1", "<@UBOT> start").await;

    assert_eq!(outbox.to("DU1").len(), 1);
    assert!(outbox.to("DU2").is_empty());
    assert_eq!(h.outstanding(), Some(1));
    assert!(h.supervisor.store().user("U2").is_none());
}

#[tokio::test]
async fn test_global_ignore_applies_to_every_channel() {
    let settings = BotSettings::default().with_ignore("global", ["ann", "bob"]);
    let mut h = Harness::new(settings);

    let outbox = h.send("C1", "U1", "<@UBOT> start").await;

    assert_eq!(
        outbox.to("C1"),
        vec!["*There are no users in the standup!*"]
    );
    assert_eq!(h.supervisor.store().standup_count(), 0);
}

#[tokio::test]
async fn test_channel_commands_need_a_mention() {
    let mut h = Harness::new(BotSettings::default());

    assert!(h.send("C1", "U1", "start").await.is_empty());
    assert_eq!(h.supervisor.store().standup_count(), 0);

    let outbox = h.send("C1", "U1", "<@UBOT> publish").await;
    assert_eq!(outbox.to("C1"), vec![lang::UNKNOWN_COMMAND]);
    let outbox = h.send("DU1", "U1", "end").await;
    assert_eq!(outbox.to("DU1"), vec![lang::NO_STANDUP]);

    h.send("C1", "U1", "<@UBOT> start").await;
    let outbox = h.send("C1", "U1", "<@UBOT> start").await;
    assert_eq!(outbox.to("C1"), vec!["dev standup already started."]);
}

#[tokio::test]
async fn test_publish_early_tells_pending_users() {
    let mut h = Harness::new(BotSettings::default());
    h.send("C1", "U1", "<@UBOT> start").await;
    h.send("DU1", "U1", "end").await;

    let outbox = h.send("C1", "U1", "<@UBOT> publish").await;

    assert!(is_report(outbox.to("C1")[0]));
    assert_eq!(outbox.to("DU2"), vec!["*dev standup ended!*"]);
    assert!(outbox.to("DU1").is_empty());
    assert_eq!(h.supervisor.store().standup_count(), 0);
}
