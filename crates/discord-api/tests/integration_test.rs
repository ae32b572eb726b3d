use discord_api::clients::{ApiClient, Connection, EmojiClient, MessageClient};
use discord_api::mock::MockTransport;
use discord_api::model::{CreateMessageParams, MessageType, ModifyGuildEmojiParams};
use discord_api::transport::{ApiRequest, Method, TransportError};
use discord_api::{ClientConfig, CommandError};
use resource_marshal::{Heap, JsonResource, Ledger, OwnedList, RawSpan, Resource};
use std::sync::Arc;

const CHANNEL: &str = "290926798999357250";

const CREATED: &str = r#"{
    "id": "334385199974967042",
    "channel_id": "290926798999357250",
    "author": {"id": "53908099506183680", "username": "Mason", "bot": true},
    "content": "Supa Hot",
    "tts": false,
    "mentions": [],
    "type": 0
}"#;

fn message_client() -> (MockTransport, MessageClient) {
    let _ = resource_marshal::tracing::try_setup_tracing();
    let mock = MockTransport::new();
    let client = MessageClient::new(mock.transport());
    (mock, client)
}

#[tokio::test]
async fn create_message_posts_content_and_scans_the_response() {
    let (mock, client) = message_client();
    mock.expect(Method::Post, format!("/channels/{CHANNEL}/messages"))
        .return_ok(CREATED);

    let message = client
        .create_message(CHANNEL, &CreateMessageParams::new("Supa Hot"))
        .await
        .expect("Failed to create message");

    assert_eq!(message.id, "334385199974967042");
    assert_eq!(message.author.username, "Mason");
    assert!(message.author.bot);
    assert_eq!(message.kind, MessageType::Default);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body.as_deref(), Some(r#"{"content":"Supa Hot"}"#));
    mock.verify();
}

#[tokio::test]
async fn optional_create_fields_are_sent_once_set() {
    let (mock, client) = message_client();
    mock.expect(Method::Post, format!("/channels/{CHANNEL}/messages"))
        .return_ok(CREATED);

    let params = CreateMessageParams::new("hi").with_nonce("1234");
    client.create_message(CHANNEL, &params).await.unwrap();

    assert_eq!(
        mock.requests()[0].body.as_deref(),
        Some(r#"{"content":"hi","nonce":"1234"}"#)
    );
}

#[tokio::test]
async fn content_length_boundary() {
    let (mock, client) = message_client();

    let result = client
        .create_message(CHANNEL, &CreateMessageParams::new("a".repeat(2000)))
        .await;
    assert!(matches!(
        result,
        Err(CommandError::ContentTooLong { len: 2000, max: 2000 })
    ));
    assert!(mock.requests().is_empty());

    mock.expect(Method::Post, format!("/channels/{CHANNEL}/messages"))
        .return_ok(CREATED);
    client
        .create_message(CHANNEL, &CreateMessageParams::new("a".repeat(1999)))
        .await
        .expect("1999 characters must be accepted");
    mock.verify();
}

#[tokio::test]
async fn length_counts_characters_not_bytes() {
    let (mock, client) = message_client();
    mock.expect(Method::Post, format!("/channels/{CHANNEL}/messages"))
        .return_ok(CREATED);

    // 1999 characters, 3998 bytes.
    let content = "é".repeat(1999);
    client
        .create_message(CHANNEL, &CreateMessageParams::new(content))
        .await
        .unwrap();
    mock.verify();
}

#[tokio::test]
async fn empty_inputs_are_refused_before_any_request() {
    let (mock, client) = message_client();

    let missing_channel = client
        .create_message("", &CreateMessageParams::new("hello"))
        .await;
    assert!(matches!(
        missing_channel,
        Err(CommandError::MissingId("channel_id"))
    ));

    let empty_content = client
        .create_message(CHANNEL, &CreateMessageParams::new(""))
        .await;
    assert!(matches!(empty_content, Err(CommandError::EmptyContent)));

    let missing_message = client.get_message(CHANNEL, "").await;
    assert!(matches!(
        missing_message,
        Err(CommandError::MissingId("message_id"))
    ));

    let over_long_nonce = client
        .create_message(CHANNEL, &CreateMessageParams::new("x").with_nonce("n".repeat(26)))
        .await
        .unwrap_err();
    assert!(over_long_nonce.is_validation());

    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn configured_limit_is_respected() {
    let mock = MockTransport::new();
    let config = ClientConfig::from_json(r#"{"max_message_len":10}"#).unwrap();
    let client = MessageClient::from_connection(Connection::new(mock.transport()).with_config(config));

    let result = client
        .create_message(CHANNEL, &CreateMessageParams::new("0123456789"))
        .await;
    assert!(matches!(
        result,
        Err(CommandError::ContentTooLong { len: 10, max: 10 })
    ));
}

#[tokio::test]
async fn transport_errors_propagate() {
    let (mock, client) = message_client();
    mock.expect(Method::Get, format!("/channels/{CHANNEL}/messages/1"))
        .return_err(TransportError::Status {
            status: 404,
            body: r#"{"message":"Unknown Message","code":10008}"#.to_string(),
        });

    let result = client.get_message(CHANNEL, "1").await;
    match result {
        Err(CommandError::Transport(TransportError::Status { status, .. })) => {
            assert_eq!(status, 404)
        }
        other => panic!("expected a 404, got {other:?}"),
    }
    mock.verify();
}

#[tokio::test]
async fn malformed_response_is_a_marshal_error() {
    let (mock, client) = message_client();
    mock.expect(Method::Get, format!("/channels/{CHANNEL}/messages/1"))
        .return_ok("<html>bad gateway</html>");

    let result = client.get_message(CHANNEL, "1").await;
    assert!(matches!(result, Err(CommandError::Marshal(_))));
}

#[tokio::test]
async fn channel_history_keeps_wire_order() {
    let (mock, client) = message_client();
    mock.expect(Method::Get, format!("/channels/{CHANNEL}/messages"))
        .return_ok(r#"[{"id":"3","content":"c"},{"id":"1","content":"a"},{"id":"2","content":"b"}]"#);

    let history = client.get_channel_messages(CHANNEL).await.unwrap();
    let ids: Vec<&str> = history.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1", "2"]);
}

#[tokio::test]
async fn responses_are_allocated_through_the_connection() {
    let ledger = Ledger::new();
    let mock = MockTransport::new();
    let connection = Connection::new(mock.transport()).with_allocator(Arc::new(ledger.clone()));
    let client = MessageClient::from_connection(connection);

    mock.expect(Method::Post, format!("/channels/{CHANNEL}/messages"))
        .return_ok(CREATED);
    let message = client
        .create_message(CHANNEL, &CreateMessageParams::new("Supa Hot"))
        .await
        .unwrap();
    assert_eq!(ledger.live(), 2);

    drop(message);
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn sparkle_patch_sends_only_the_defined_name() {
    let mock = MockTransport::new();
    let client = EmojiClient::new(mock.transport());
    mock.expect(Method::Patch, "/guilds/197038439483310086/emojis/41771983429993937")
        .return_ok(r#"{"id":"41771983429993937","name":"sparkle","roles":["1","2","3"]}"#);

    let mut params = ModifyGuildEmojiParams::alloc(&Heap).unwrap();
    params
        .from_json(r#"{"name":"sparkle","roles":[1,2,3]}"#, &Heap)
        .unwrap();
    params.switches.define(ModifyGuildEmojiParams::NAME_FIELD);

    let emoji = client
        .modify_guild_emoji("197038439483310086", "41771983429993937", &params)
        .await
        .unwrap();

    assert_eq!(
        mock.requests()[0],
        ApiRequest::patch(
            "/guilds/197038439483310086/emojis/41771983429993937",
            r#"{"name":"sparkle"}"#
        )
    );
    assert_eq!(emoji.name, "sparkle");
    assert_eq!(emoji.roles.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    mock.verify();
}

#[tokio::test]
async fn clearing_roles_sends_null() {
    let mock = MockTransport::new();
    let client = EmojiClient::new(mock.transport());
    mock.expect(Method::Patch, "/guilds/1/emojis/2").return_ok("{}");

    let mut params = ModifyGuildEmojiParams::default();
    params.set_roles(OwnedList::from_json(RawSpan::whole("[5]"), &Heap).unwrap());
    params.switches.request_null(ModifyGuildEmojiParams::ROLES);
    client.modify_guild_emoji("1", "2", &params).await.unwrap();

    assert_eq!(mock.requests()[0].body.as_deref(), Some(r#"{"roles":null}"#));
}

#[tokio::test]
async fn emoji_commands_require_ids() {
    let mock = MockTransport::new();
    let client = EmojiClient::new(mock.transport());
    let params = ModifyGuildEmojiParams::default();

    assert!(matches!(
        client.modify_guild_emoji("", "2", &params).await,
        Err(CommandError::MissingId("guild_id"))
    ));
    assert!(matches!(
        client.modify_guild_emoji("1", "", &params).await,
        Err(CommandError::MissingId("emoji_id"))
    ));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn guild_emojis_list_in_wire_order() {
    let mock = MockTransport::new();
    let client = EmojiClient::new(mock.transport());
    mock.expect(Method::Get, "/guilds/1/emojis")
        .return_ok(r#"[{"id":"9","name":"b"},{"id":"8","name":"a","user":{"id":"4"}}]"#);

    let emojis = client.list_guild_emojis("1").await.unwrap();
    assert_eq!(emojis.len(), 2);
    assert_eq!(emojis.get(0).map(|e| e.name.as_str()), Some("b"));
    assert!(emojis.get(1).and_then(|e| e.user.as_ref()).is_some());
}

#[tokio::test]
async fn dispatch_is_shared_by_clients() {
    let mock = MockTransport::new();
    let client = MessageClient::new(mock.transport());
    mock.expect(Method::Get, "/users/@me").return_ok(r#"{"id":"1","username":"me"}"#);

    let user = client
        .dispatch::<discord_api::model::User>(ApiRequest::get("/users/@me"))
        .await
        .unwrap();
    assert_eq!(user.username, "me");
}
