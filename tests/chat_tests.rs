mod common;

use anyhow::Result;
use common::{app_token, config, context, path, ScriptedPrompter, ME};
use m365ctl::{
    commands::chat::{self, ChatGetArgs},
    context::CommandContext,
};
use mockito::{Matcher, Server};
use serde_json::json;

fn chats_body() -> String {
    json!({"value": [
        {
            "id": "19:group-a@thread.v2",
            "topic": null,
            "chatType": "group",
            "members": [
                {"email": ME},
                {"email": "alex@contoso.com"},
                {"email": "adele@contoso.com"},
                {"email": "lynne@contoso.com"}
            ]
        },
        {
            "id": "19:group-b@thread.v2",
            "topic": "Launch",
            "chatType": "group",
            "members": [
                {"email": "Megan@Contoso.com"},
                {"email": "alex@contoso.com"},
                {"email": "adele@contoso.com"}
            ]
        }
    ]})
    .to_string()
}

#[tokio::test]
async fn test_get_by_participants_matches_exact_member_set() -> Result<()> {
    let mut server = Server::new_async().await;
    let lookup = server
        .mock("GET", path("/v1.0/chats"))
        .match_query(Matcher::UrlEncoded(
            "$filter".to_string(),
            "chatType eq 'group'".to_string(),
        ))
        .with_status(200)
        .with_body(chats_body())
        .expect(1)
        .create_async()
        .await;
    let fetched = server
        .mock("GET", path("/v1.0/chats/19:group-b@thread.v2"))
        .with_status(200)
        .with_body(json!({"id": "19:group-b@thread.v2", "topic": "Launch"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let args = ChatGetArgs {
        participants: Some(vec![
            "Adele@contoso.com".to_string(),
            "alex@contoso.com".to_string(),
        ]),
        ..Default::default()
    };
    let chat = chat::get(&ctx, &args).await?;

    assert_eq!(chat["topic"], "Launch");
    lookup.assert_async().await;
    fetched.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_get_by_participants_without_match() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v1.0/chats"))
        .with_status(200)
        .with_body(chats_body())
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let args = ChatGetArgs {
        participants: Some(vec!["adele@contoso.com".to_string(), "nestor@contoso.com".to_string()]),
        ..Default::default()
    };
    let err = chat::get(&ctx, &args).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "No chat conversation was found with adele@contoso.com, nestor@contoso.com."
    );
    Ok(())
}

#[tokio::test]
async fn test_participants_require_delegated_token() -> Result<()> {
    let mut server = Server::new_async().await;
    let never = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let ctx = CommandContext::new(config(&server, false), Some(app_token()))?;
    let args = ChatGetArgs {
        participants: Some(vec!["alex@contoso.com".to_string()]),
        ..Default::default()
    };
    let err = chat::get(&ctx, &args).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "This command requires delegated permissions when using --participants."
    );
    never.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_token_without_scp_or_roles_is_rejected() -> Result<()> {
    let server = Server::new_async().await;
    let ctx = CommandContext::new(
        config(&server, false),
        Some(common::token(json!({"upn": ME}))),
    )?;
    let args = ChatGetArgs {
        participants: Some(vec!["alex@contoso.com".to_string()]),
        ..Default::default()
    };
    let err = chat::get(&ctx, &args).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unable to determine if the access token is delegated or application-only."
    );
    Ok(())
}

#[tokio::test]
async fn test_get_by_name_not_found() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v1.0/chats"))
        .with_status(200)
        .with_body(json!({"value": []}).to_string())
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let args = ChatGetArgs {
        name: Some("Weekly sync".to_string()),
        ..Default::default()
    };
    let err = chat::get(&ctx, &args).await.unwrap_err();

    assert_eq!(err.to_string(), "The specified chat 'Weekly sync' does not exist.");
    Ok(())
}
