mod common;

use anyhow::Result;
use common::{context, path, ScriptedPrompter};
use m365ctl::commands::group::{self, GroupGetArgs, GroupListArgs, RecycleBinClearArgs};
use mockito::Server;
use serde_json::json;

const FINANCE_1: &str = "00000000-0000-0000-0000-000000000001";
const FINANCE_2: &str = "00000000-0000-0000-0000-000000000002";

#[tokio::test]
async fn test_list_follows_next_links() -> Result<()> {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", path("/v1.0/groups"))
        .with_status(200)
        .with_body(
            json!({
                "value": [{"id": "1"}, {"id": "2"}],
                "@odata.nextLink": format!("{}/next/groups-2", server.url())
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", path("/next/groups-2"))
        .with_status(200)
        .with_body(json!({"value": [{"id": "3"}]}).to_string())
        .expect(1)
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let groups = group::list(&ctx, &GroupListArgs::default()).await?;

    assert_eq!(groups, json!([{"id": "1"}, {"id": "2"}, {"id": "3"}]));
    first.assert_async().await;
    second.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_get_by_mail_nickname_lists_all_matches() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v1.0/groups"))
        .with_status(200)
        .with_body(
            json!({"value": [
                {"id": FINANCE_1, "displayName": "Finance"},
                {"id": FINANCE_2, "displayName": "Finance EU"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let args = GroupGetArgs {
        mail_nickname: Some("finance".to_string()),
        ..Default::default()
    };
    let err = group::get(&ctx, &args).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "Multiple groups with mail nickname 'finance' found. Found: {}, {}.",
            FINANCE_1, FINANCE_2
        )
    );
    Ok(())
}

#[tokio::test]
async fn test_get_by_name_not_found() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v1.0/groups"))
        .with_status(200)
        .with_body(json!({"value": []}).to_string())
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let args = GroupGetArgs {
        display_name: Some("Marketing".to_string()),
        ..Default::default()
    };
    let err = group::get(&ctx, &args).await.unwrap_err();

    assert_eq!(err.to_string(), "The specified group 'Marketing' does not exist.");
    Ok(())
}

#[tokio::test]
async fn test_prompt_mode_picks_between_matches() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v1.0/groups"))
        .with_status(200)
        .with_body(
            json!({"value": [
                {"id": FINANCE_1, "displayName": "Finance"},
                {"id": FINANCE_2, "displayName": "Finance"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    let chosen = server
        .mock("GET", path(&format!("/v1.0/groups/{}", FINANCE_2)))
        .with_status(200)
        .with_body(json!({"id": FINANCE_2, "displayName": "Finance"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let prompter = ScriptedPrompter::new().selecting(1);
    let ctx = context(&server, true, prompter.clone())?;
    let args = GroupGetArgs {
        display_name: Some("Finance".to_string()),
        ..Default::default()
    };
    let group = group::get(&ctx, &args).await?;

    assert_eq!(group["id"], FINANCE_2);
    assert_eq!(
        prompter.asked(),
        vec!["Multiple groups with name 'Finance' found. Please choose one:"]
    );
    chosen.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_missing_locator_is_prompted_for() -> Result<()> {
    let mut server = Server::new_async().await;
    let fetched = server
        .mock("GET", path(&format!("/v1.0/groups/{}", FINANCE_1)))
        .with_status(200)
        .with_body(json!({"id": FINANCE_1}).to_string())
        .expect(1)
        .create_async()
        .await;

    let prompter = ScriptedPrompter::new().selecting(0).answering(FINANCE_1);
    let ctx = context(&server, true, prompter.clone())?;
    group::get(&ctx, &GroupGetArgs::default()).await?;

    assert_eq!(
        prompter.asked(),
        vec!["Please specify one of the following options:", "--id:"]
    );
    fetched.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_missing_locator_without_prompt_is_usage_error() -> Result<()> {
    let server = Server::new_async().await;
    let ctx = context(&server, false, ScriptedPrompter::new())?;

    let err = group::get(&ctx, &GroupGetArgs::default()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Specify either --id, --display-name or --mail-nickname."
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_id_is_rejected_before_any_request() -> Result<()> {
    let mut server = Server::new_async().await;
    let never = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let args = GroupGetArgs {
        id: Some("not-a-guid".to_string()),
        ..Default::default()
    };
    let err = group::get(&ctx, &args).await.unwrap_err();

    assert_eq!(err.to_string(), "not-a-guid is not a valid GUID for option --id.");
    never.assert_async().await;
    Ok(())
}

async fn mock_deleted_groups(server: &mut Server) -> (mockito::Mock, mockito::Mock) {
    let first = server
        .mock("GET", path("/v1.0/directory/deletedItems/Microsoft.Graph.Group"))
        .with_status(200)
        .with_body(
            json!({
                "value": [{"id": "g1"}, {"id": "g2"}],
                "@odata.nextLink": format!("{}/next/deleted-2", server.url())
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", path("/next/deleted-2"))
        .with_status(200)
        .with_body(json!({"value": [{"id": "g3"}]}).to_string())
        .create_async()
        .await;
    (first, second)
}

#[tokio::test]
async fn test_clear_deletes_every_item_across_pages() -> Result<()> {
    let mut server = Server::new_async().await;
    let _pages = mock_deleted_groups(&mut server).await;
    let mut deletes = Vec::new();
    for id in ["g1", "g2", "g3"] {
        deletes.push(
            server
                .mock("DELETE", path(&format!("/v1.0/directory/deletedItems/{}", id)))
                .with_status(204)
                .expect(1)
                .create_async()
                .await,
        );
    }

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    group::clear_deleted(&ctx, &RecycleBinClearArgs { force: true }).await?;

    for delete in deletes {
        delete.assert_async().await;
    }
    Ok(())
}

#[tokio::test]
async fn test_clear_with_empty_recycle_bin_deletes_nothing() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v1.0/directory/deletedItems/Microsoft.Graph.Group"))
        .with_status(200)
        .with_body(json!({"value": []}).to_string())
        .create_async()
        .await;
    let deletes = server
        .mock("DELETE", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    group::clear_deleted(&ctx, &RecycleBinClearArgs { force: true }).await?;

    deletes.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_declined_confirmation_sends_nothing() -> Result<()> {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let deletes = server
        .mock("DELETE", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let prompter = ScriptedPrompter::new().confirming(false);
    let ctx = context(&server, false, prompter.clone())?;
    group::clear_deleted(&ctx, &RecycleBinClearArgs { force: false }).await?;

    assert_eq!(
        prompter.asked(),
        vec!["Are you sure you want to clear all M365 Groups from the recycle bin?"]
    );
    any.assert_async().await;
    deletes.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_failed_delete_stops_the_clear() -> Result<()> {
    let mut server = Server::new_async().await;
    let _pages = mock_deleted_groups(&mut server).await;
    let _mock = server
        .mock("DELETE", path("/v1.0/directory/deletedItems/g1"))
        .with_status(403)
        .with_body(json!({"error": {"code": "Authorization_RequestDenied", "message": "Insufficient privileges to complete the operation."}}).to_string())
        .create_async()
        .await;
    let later = server
        .mock("DELETE", path("/v1.0/directory/deletedItems/g2"))
        .expect(0)
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let err = group::clear_deleted(&ctx, &RecycleBinClearArgs { force: true })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Insufficient privileges to complete the operation.");
    later.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_repeated_lookup_gives_same_result() -> Result<()> {
    let mut server = Server::new_async().await;
    let lookup = server
        .mock("GET", path("/v1.0/groups"))
        .with_status(200)
        .with_body(json!({"value": [{"id": FINANCE_1, "displayName": "Finance"}]}).to_string())
        .expect(2)
        .create_async()
        .await;
    let fetched = server
        .mock("GET", path(&format!("/v1.0/groups/{}", FINANCE_1)))
        .with_status(200)
        .with_body(json!({"id": FINANCE_1, "displayName": "Finance"}).to_string())
        .expect(2)
        .create_async()
        .await;

    let ctx = context(&server, false, ScriptedPrompter::new())?;
    let args = GroupGetArgs {
        display_name: Some("Finance".to_string()),
        ..Default::default()
    };
    let first = group::get(&ctx, &args).await?;
    let second = group::get(&ctx, &args).await?;

    assert_eq!(first, second);
    lookup.assert_async().await;
    fetched.assert_async().await;
    Ok(())
}
