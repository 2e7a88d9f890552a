//! End-to-end: configuration, fixture seed and the privileges handler.

use std::io::Write;
use std::net::IpAddr;
use std::sync::Arc;

use geocat_domain::{AccessManager, Requester, UserSession};
use geocat_server::{AdminOperParams, CatalogFixture, GetAdminOperHandler, ServerConfig};
use geocat_storage::{MemoryCatalogStore, Profile, UserId};
use tempfile::NamedTempFile;

const SEED: &str = r#"
users:
  - { id: 1, username: admin, profile: Administrator }
  - { id: 2, username: editor, profile: Editor, emails: [editor@example.com] }
groups:
  - { id: 2, name: sample }
  - { id: 3, name: partners }
memberships:
  - { user_id: 2, group_id: 2, profile: Editor }
  - { user_id: 2, group_id: 3, profile: RegisteredUser }
metadata:
  - id: 10
    uuid: da165110-88fd-11da-a88f-000d939bc5d8
    source_info: { owner: 2, group_owner: 2 }
grants:
  - { metadata_id: 10, group_id: 1, operation_id: 0 }
  - { metadata_id: 10, group_id: 0, operation_id: 1 }
  - { metadata_id: 10, group_id: 2, operation_id: 2 }
"#;

async fn seeded_handler(
    config: &ServerConfig,
) -> GetAdminOperHandler<MemoryCatalogStore, AccessManager<MemoryCatalogStore>> {
    let store = MemoryCatalogStore::new_shared();
    CatalogFixture::from_yaml(SEED)
        .unwrap()
        .load_into(store.as_ref())
        .await
        .unwrap();
    let access =
        AccessManager::new(Arc::clone(&store)).with_intranet(config.access.intranet().unwrap());
    GetAdminOperHandler::new(store, Arc::new(access))
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_anonymous_local_request() {
    let handler = seeded_handler(&ServerConfig::default()).await;
    let requester = Requester::new(UserSession::anonymous(), ip("127.0.0.1"));

    let response = handler
        .exec(
            &AdminOperParams::by_uuid("da165110-88fd-11da-a88f-000d939bc5d8"),
            &requester,
        )
        .await
        .unwrap();

    assert_eq!(response.id, "10");
    assert_eq!(response.owner, "false");
    assert_eq!(response.ownerid, "2");
    assert_eq!(response.group_owner, "2");
    assert_eq!(response.operations.len(), 6);

    let user_groups: Vec<&str> = response
        .groups
        .iter()
        .filter(|g| g.user_group == "true")
        .map(|g| g.name.as_str())
        .collect();
    assert_eq!(user_groups, vec!["intranet", "all"]);
    assert!(response.groups.iter().all(|g| g.user_profile.is_empty()));
}

#[tokio::test]
async fn test_owner_from_configured_intranet() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "access:\n  intranet_network: 10.20.0.0\n  intranet_netmask: 255.255.0.0\n"
    )
    .unwrap();
    let config = ServerConfig::load(file.path()).unwrap();
    let handler = seeded_handler(&config).await;
    let requester = Requester::new(
        UserSession::authenticated(UserId(2), "editor", Profile::Editor),
        ip("10.20.4.4"),
    );

    let response = handler
        .exec(&AdminOperParams::by_id("10"), &requester)
        .await
        .unwrap();

    assert_eq!(response.owner, "true");
    let sample = response.groups.iter().find(|g| g.name == "sample").unwrap();
    assert_eq!(sample.user_group, "true");
    assert_eq!(sample.user_profile, vec!["Editor".to_string()]);
    let on: Vec<&str> = sample
        .oper
        .iter()
        .filter(|o| o.on == "true")
        .map(|o| o.id.as_str())
        .collect();
    assert_eq!(on, vec!["2"]);

    let partners = response.groups.iter().find(|g| g.name == "partners").unwrap();
    assert_eq!(partners.user_profile, vec!["RegisteredUser".to_string()]);
    assert!(partners.oper.iter().all(|o| o.on == "false"));
}
