//! Host tenant management and tenant sub-user management.

use transitpay::{
    directory::{DirectoryError, NewTenant, NewUser, TenantUpdate, UserUpdate},
    keys::TenantScope,
    model::{Status, UserRole},
};

use crate::helpers::*;

fn new_tenant(code: &str, name: &str, phone: &str) -> NewTenant {
    NewTenant {
        code: code.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        notes: None,
    }
}

// === Tenants ===

#[tokio::test]
async fn created_tenant_is_listed_with_normalized_fields() {
    let tp = seeded_portal();
    let tenant = tp
        .portal
        .tenants()
        .create(NewTenant {
            notes: Some("  ".into()),
            ..new_tenant(" acme ", " Acme Transport ", "0123000111")
        })
        .expect("Failed to create tenant");

    assert_eq!(tenant.code, "ACME");
    assert_eq!(tenant.name, "Acme Transport");
    assert_eq!(tenant.phone, "+60123000111");
    assert_eq!(tenant.status, Status::Active);
    assert!(tenant.notes.is_none());
    assert!(tenant.id.starts_with("TN"));
    let codes: Vec<_> = tp.portal.tenants().list().unwrap().into_iter().map(|t| t.code).collect();
    assert_eq!(codes, vec!["DEMO", "ACME"]);
}

#[tokio::test]
async fn new_tenant_document_stays_local_until_login() {
    let tp = seeded_portal();
    create_tenant(&tp.portal, "ACME", "0123000111");
    tp.settle().await;

    let local = tp.portal.sync().load_local(&TenantScope::tenant("ACME")).unwrap();
    assert_eq!(local.expect("Default document missing").next_receipt_number, 1001);
    assert!(tp.remote.peek("tenants/ACME").await.is_none());
    let registry = tp.remote.peek("config/registry").await.expect("Registry not pushed");
    assert_eq!(registry["tenants"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let tp = seeded_portal();
    let tenants = tp.portal.tenants();

    let err = tenants.create(new_tenant("demo", "Again", "0123000111")).unwrap_err();
    assert!(matches!(err, DirectoryError::DuplicateCode { .. }));
    assert!(err.is_conflict());

    let err = tenants.create(new_tenant("host", "Host", "0123000111")).unwrap_err();
    assert!(matches!(err, DirectoryError::ReservedCode { .. }));

    let err = tenants.create(new_tenant("a!", "Bad", "0123000111")).unwrap_err();
    assert!(err.is_validation_error());

    let err = tenants.create(new_tenant("ACME", " ", "0123000111")).unwrap_err();
    assert!(matches!(err, DirectoryError::MissingName));

    let err = tenants.create(new_tenant("ACME", "Acme", "")).unwrap_err();
    assert!(matches!(err, DirectoryError::MissingPhone));

    assert_eq!(tenants.list().unwrap().len(), 1);
}

#[tokio::test]
async fn tenants_created_together_get_distinct_ids() {
    let tp = seeded_portal();
    let a = create_tenant(&tp.portal, "AAA", "0123000111");
    let b = create_tenant(&tp.portal, "BBB", "0123000222");
    let c = create_tenant(&tp.portal, "CCC", "0123000333");
    assert_ne!(a.id, b.id);
    assert_ne!(b.id, c.id);
    assert_ne!(a.id, c.id);
}

#[tokio::test]
async fn code_change_moves_the_document() {
    let tp = seeded_portal();
    let acme = create_tenant(&tp.portal, "ACME", "0123000111");
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "ACME", "0123000111").await;
    ctx.sessions().logout().await.expect("Logout failed");
    tp.settle().await;

    let updated = tp
        .portal
        .tenants()
        .update(
            &acme.id,
            TenantUpdate {
                code: Some("acme2".into()),
                name: Some("Acme Two".into()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update tenant");
    tp.settle().await;

    assert_eq!(updated.code, "ACME2");
    assert_eq!(updated.name, "Acme Two");
    assert_eq!(updated.phone, acme.phone);
    let sync = tp.portal.sync();
    assert!(sync.load_local(&TenantScope::tenant("ACME")).unwrap().is_none());
    assert!(sync.load_local(&TenantScope::tenant("ACME2")).unwrap().is_some());
    assert!(tp.remote.peek("tenants/ACME").await.is_none());
    assert!(tp.remote.peek("tenants/ACME2").await.is_some());

    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "ACME2", "0123000111").await;
}

#[tokio::test]
async fn update_rejects_taken_code() {
    let tp = seeded_portal();
    let acme = create_tenant(&tp.portal, "ACME", "0123000111");
    let err = tp
        .portal
        .tenants()
        .update(
            &acme.id,
            TenantUpdate {
                code: Some("Demo".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::DuplicateCode { .. }));

    // Keeping one's own code is not a conflict.
    tp.portal
        .tenants()
        .update(
            &acme.id,
            TenantUpdate {
                code: Some("acme".into()),
                ..Default::default()
            },
        )
        .await
        .expect("Unchanged code rejected");
}

#[tokio::test]
async fn update_of_missing_tenant_is_not_found() {
    let tp = seeded_portal();
    let err = tp
        .portal
        .tenants()
        .update("TN-404", TenantUpdate::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn toggle_status_flips_back_and_forth() {
    let tp = seeded_portal();
    let acme = create_tenant(&tp.portal, "ACME", "0123000111");
    let tenants = tp.portal.tenants();

    assert_eq!(tenants.toggle_status(&acme.id).unwrap().status, Status::Suspended);
    assert_eq!(tenants.get(&acme.id).unwrap().status, Status::Suspended);
    assert_eq!(tenants.toggle_status(&acme.id).unwrap().status, Status::Active);
}

#[tokio::test]
async fn delete_removes_registry_entry_and_documents() {
    let tp = seeded_portal();
    let acme = create_tenant(&tp.portal, "ACME", "0123000111");
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "ACME", "0123000111").await;
    ctx.sessions().logout().await.expect("Logout failed");
    tp.settle().await;
    assert!(tp.remote.peek("tenants/ACME").await.is_some());

    tp.portal.tenants().delete(&acme.id).expect("Failed to delete tenant");
    tp.settle().await;

    assert!(tp.portal.tenants().find("acme").unwrap().is_none());
    assert!(tp.portal.sync().load_local(&TenantScope::tenant("ACME")).unwrap().is_none());
    assert!(tp.remote.peek("tenants/ACME").await.is_none());
    let registry = tp.remote.peek("config/registry").await.unwrap();
    assert_eq!(registry["tenants"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn seeding_twice_keeps_existing_registry() {
    let tp = seeded_portal();
    create_tenant(&tp.portal, "ACME", "0123000111");
    assert!(!tp.portal.tenants().seed_demo().unwrap());
    assert_eq!(tp.portal.tenants().list().unwrap().len(), 2);
}

// === Sub-users ===

#[tokio::test]
async fn owner_manages_sub_users() {
    let tp = seeded_portal();
    tp.settle().await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;
    let users = ctx.users();

    let ali = users
        .add(NewUser {
            name: "Ali".into(),
            phone: "0199990000".into(),
            role: UserRole::Operator,
        })
        .expect("Failed to add sub-user");
    assert_eq!(ali.phone, SUB_USER_PHONE);
    assert!(ali.id.starts_with("USR"));

    let updated = users
        .update(
            &ali.id,
            UserUpdate {
                role: Some(UserRole::Admin),
                ..Default::default()
            },
        )
        .expect("Failed to update sub-user");
    assert_eq!(updated.role, UserRole::Admin);
    assert_eq!(updated.name, "Ali");

    assert_eq!(users.toggle_status(&ali.id).unwrap().status, Status::Suspended);
    users.delete(&ali.id).expect("Failed to delete sub-user");
    assert!(users.list().is_empty());
    tp.settle().await;

    let remote = tp.remote.peek("tenants/DEMO").await.unwrap();
    assert_eq!(remote["users"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn duplicate_sub_user_phone_is_rejected() {
    let tp = seeded_portal();
    tp.settle().await;
    add_sub_user(&tp.portal, "DEMO", "Ali", SUB_USER_PHONE, UserRole::Viewer).await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", DEMO_PHONE).await;

    let err = ctx
        .users()
        .add(NewUser {
            name: "Other Ali".into(),
            phone: "60199990000".into(),
            role: UserRole::Viewer,
        })
        .unwrap_err();
    assert!(matches!(err, DirectoryError::DuplicatePhone { .. }));
}

#[tokio::test]
async fn sub_user_cannot_delete_themselves() {
    let tp = seeded_portal();
    tp.settle().await;
    let id = add_sub_user(&tp.portal, "DEMO", "Siti", SUB_USER_PHONE, UserRole::Admin).await;
    let ctx = tp.portal.open_context();
    login_tenant(&ctx, "DEMO", SUB_USER_PHONE).await;

    let err = ctx.users().delete(&id).unwrap_err();
    assert!(matches!(err, DirectoryError::CannotDeleteSelf));
    assert_eq!(ctx.users().list().len(), 1);
}

#[tokio::test]
async fn sub_users_need_a_tenant_scope() {
    let tp = seeded_portal();
    let ctx = tp.portal.open_context();
    let err = ctx
        .users()
        .add(NewUser {
            name: "Ali".into(),
            phone: SUB_USER_PHONE.into(),
            role: UserRole::Viewer,
        })
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NoActiveTenant));
}
