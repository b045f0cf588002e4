use reqwest::multipart::{Form, Part};

use crate::common::{TestApp, routes};

mod create_file {
    use super::*;

    #[tokio::test]
    async fn blob_exists_at_recorded_path() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;

        let res = app
            .upload_with_token(project_id, "main.py", b"print('hi')".to_vec(), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.body["id"].as_str().unwrap();
        let path = res.body["storage_path"].as_str().unwrap();
        assert_eq!(path, format!("projects/{project_id}/files/{id}/main.py"));
        assert_eq!(res.body["file_name"], "main.py");
        assert_eq!(res.body["size"], 11);
        assert!(res.body["content_type"].as_str().is_some());

        assert_eq!(app.blobs.content(path).unwrap(), b"print('hi')");
        let row = app.file_row(id).await.unwrap();
        assert_eq!(row.storage_path, path);
        assert_eq!(row.project_id, project_id);
    }

    #[tokio::test]
    async fn file_name_field_overrides_upload_name() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;

        let form = Form::new()
            .part("file", Part::bytes(b"body".to_vec()).file_name("blob.bin"))
            .text("file_name", "notes.md");
        let res = app
            .send_form(
                reqwest::Method::POST,
                &routes::project_files(project_id),
                form,
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_name"], "notes.md");
        assert!(res.body["storage_path"].as_str().unwrap().ends_with("/notes.md"));
    }

    #[tokio::test]
    async fn path_like_name_is_rejected_before_upload() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;

        let form = Form::new()
            .part("file", Part::bytes(b"x".to_vec()).file_name("ok.txt"))
            .text("file_name", "../escape.txt");
        let res = app
            .send_form(
                reqwest::Method::POST,
                &routes::project_files(project_id),
                form,
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert_eq!(app.blobs.len(), 0);
        assert_eq!(app.file_count(project_id).await, 0);
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;

        let form = Form::new().text("file_name", "main.py");
        let res = app
            .send_form(
                reqwest::Method::POST,
                &routes::project_files(project_id),
                form,
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");

        let res = app
            .upload_with_token(777, "a.txt", b"a".to_vec(), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(app.blobs.len(), 0);
    }

    #[tokio::test]
    async fn other_owner_cannot_upload() {
        let app = TestApp::spawn().await;
        let project_id = app.create_project(&app.token_for("u1"), "P").await;

        let res = app
            .upload_with_token(project_id, "a.txt", b"a".to_vec(), &app.token_for("u2"))
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "PERMISSION_DENIED");
        assert_eq!(app.blobs.len(), 0);
        assert_eq!(app.file_count(project_id).await, 0);
    }
}

mod list_files {
    use super::*;

    #[tokio::test]
    async fn lists_metadata_in_creation_order() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        app.create_file(&token, project_id, "one.txt", b"1").await;
        app.create_file(&token, project_id, "two.txt", b"22").await;

        let res = app
            .get_with_token(&routes::project_files(project_id), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        let files = res.body["files"].as_array().unwrap();
        assert_eq!(files[0]["file_name"], "one.txt");
        assert_eq!(files[1]["file_name"], "two.txt");
        assert_eq!(files[1]["size"], 2);
    }
}

mod get_file {
    use super::*;

    #[tokio::test]
    async fn returns_metadata_and_content() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"alpha").await;
        let id = created["id"].as_str().unwrap();

        let res = app.get_with_token(&routes::file(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["file"]["id"], id);
        assert_eq!(res.body["file"]["file_name"], "a.txt");
        assert_eq!(res.body["content"], "alpha");
    }

    #[tokio::test]
    async fn missing_blob_is_distinct_from_missing_row() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"alpha").await;
        let id = created["id"].as_str().unwrap();
        assert!(app.blobs.remove_externally(created["storage_path"].as_str().unwrap()));

        let res = app.get_with_token(&routes::file(id), &token).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "BLOB_NOT_FOUND");

        let res = app
            .get_with_token(&routes::file(&uuid::Uuid::now_v7().to_string()), &token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn other_owner_is_forbidden() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"alpha").await;

        let res = app
            .get_with_token(
                &routes::file(created["id"].as_str().unwrap()),
                &app.token_for("u2"),
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod update_file {
    use super::*;

    #[tokio::test]
    async fn content_update_overwrites_in_place() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"old").await;
        let id = created["id"].as_str().unwrap();
        let path = created["storage_path"].as_str().unwrap();

        let res = app
            .update_file_with_token(id, None, Some(b"newer".to_vec()), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["storage_path"], path);
        assert_eq!(res.body["size"], 5);
        assert_ne!(res.body["content_hash"], created["content_hash"]);
        assert_eq!(app.blobs.content(path).unwrap(), b"newer");
    }

    #[tokio::test]
    async fn rename_relocates_blob() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "draft.txt", b"body").await;
        let id = created["id"].as_str().unwrap();
        let old_path = created["storage_path"].as_str().unwrap();

        let res = app
            .update_file_with_token(id, Some("final.json"), None, &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new_path = res.body["storage_path"].as_str().unwrap();
        assert_eq!(new_path, format!("projects/{project_id}/files/{id}/final.json"));
        assert_eq!(res.body["file_name"], "final.json");
        assert_eq!(res.body["content_type"], "application/json");
        assert_eq!(app.blobs.content(new_path).unwrap(), b"body");
        assert!(!app.blobs.contains(old_path));

        let row = app.file_row(id).await.unwrap();
        assert_eq!(row.storage_path, new_path);
    }

    #[tokio::test]
    async fn rename_with_content_writes_new_content() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"one").await;
        let id = created["id"].as_str().unwrap();

        let res = app
            .update_file_with_token(id, Some("b.txt"), Some(b"two".to_vec()), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new_path = res.body["storage_path"].as_str().unwrap();
        assert_eq!(app.blobs.content(new_path).unwrap(), b"two");
        assert_eq!(app.blobs.len(), 1);
    }

    #[tokio::test]
    async fn empty_update_returns_file_unchanged() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"same").await;
        let id = created["id"].as_str().unwrap();

        let res = app.update_file_with_token(id, None, None, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["updated_at"], created["updated_at"]);
    }

    #[tokio::test]
    async fn other_owner_cannot_update() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"mine").await;
        let id = created["id"].as_str().unwrap();
        let path = created["storage_path"].as_str().unwrap();

        let res = app
            .update_file_with_token(
                id,
                Some("b.txt"),
                Some(b"theirs".to_vec()),
                &app.token_for("u2"),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(app.blobs.content(path).unwrap(), b"mine");
        assert_eq!(app.blobs.len(), 1);
        assert_eq!(app.file_row(id).await.unwrap().file_name, "a.txt");
    }
}

mod delete_file {
    use super::*;

    #[tokio::test]
    async fn removes_blob_then_row() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"bye").await;
        let id = created["id"].as_str().unwrap();

        let res = app.delete_with_token(&routes::file(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert!(res.body["orphaned_blob"].is_null());
        assert!(app.file_row(id).await.is_none());
        assert!(!app.blobs.contains(created["storage_path"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn succeeds_when_blob_already_gone() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"bye").await;
        let id = created["id"].as_str().unwrap();
        app.blobs
            .remove_externally(created["storage_path"].as_str().unwrap());

        let res = app.delete_with_token(&routes::file(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert!(res.body["orphaned_blob"].is_null());
        assert!(app.file_row(id).await.is_none());
    }

    #[tokio::test]
    async fn other_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let token = app.token_for("u1");
        let project_id = app.create_project(&token, "P").await;
        let created = app.create_file(&token, project_id, "a.txt", b"keep").await;
        let id = created["id"].as_str().unwrap();

        let res = app
            .delete_with_token(&routes::file(id), &app.token_for("u2"))
            .await;

        assert_eq!(res.status, 403);
        assert!(app.file_row(id).await.is_some());
        assert!(app.blobs.contains(created["storage_path"].as_str().unwrap()));
    }
}
