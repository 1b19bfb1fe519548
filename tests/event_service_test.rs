//! Integration tests for the scheduling services using in-memory SQLite.

mod common;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use slotify::db::entities::{event, membership, signup, slot, tag};
use slotify::db::services::{
    EventError, EventFilter, EventPatch, EventService, GroupError, GroupService, MAX_PAGE_SIZE,
    MembershipService, NewEvent, SignupError, SignupService, get_all_tags, is_unique_violation,
    seed_tags,
};
use slotify::services::epoch::{from_epoch_millis, to_epoch_millis};

use common::{add_member, create_group, create_user, setup_db};

fn new_event(slots: &[(&str, i32)], is_public: bool) -> NewEvent {
    NewEvent {
        title: "Community cleanup".to_string(),
        description: "Bring gloves".to_string(),
        start_date_time: from_epoch_millis(1_700_000_000_000).unwrap(),
        end_date_time: from_epoch_millis(1_700_007_200_000).unwrap(),
        location: "Park".to_string(),
        is_public,
        slots: slots.iter().map(|(name, limit)| (name.to_string(), *limit)).collect(),
    }
}

#[tokio::test]
async fn test_authorize_requires_approved_admin() {
    let db = setup_db().await;
    let group = create_group(&db, "Volunteers").await;

    let outsider = create_user(&db, "outsider").await;
    let pending_admin = create_user(&db, "pending_admin").await;
    let member = create_user(&db, "member").await;
    let admin = create_user(&db, "admin").await;

    add_member(&db, group.id, pending_admin.id, false, true).await;
    add_member(&db, group.id, member.id, true, false).await;
    add_member(&db, group.id, admin.id, true, true).await;

    assert!(!MembershipService::authorize(&db, outsider.id, group.id).await.unwrap());
    assert!(!MembershipService::authorize(&db, pending_admin.id, group.id).await.unwrap());
    assert!(!MembershipService::authorize(&db, member.id, group.id).await.unwrap());
    assert!(MembershipService::authorize(&db, admin.id, group.id).await.unwrap());

    // Admin of one group only.
    let other = create_group(&db, "Other").await;
    assert!(!MembershipService::authorize(&db, admin.id, other.id).await.unwrap());
    assert_eq!(MembershipService::admin_group_ids(&db, admin.id).await.unwrap(), vec![group.id]);
}

#[tokio::test]
async fn test_create_event_persists_one_slot_per_tag() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;

    let detail = EventService::create_event(&db, group.id, new_event(&[("speaker", 3), ("volunteer", 5)], true))
        .await
        .unwrap();

    assert_eq!(detail.event.group_id, group.id);
    assert_eq!(to_epoch_millis(&detail.event.start_date_time), 1_700_000_000_000);
    assert_eq!(event::Entity::find().count(&db).await.unwrap(), 1);

    let slots = slot::Entity::find().find_also_related(tag::Entity).all(&db).await.unwrap();
    assert_eq!(slots.len(), 2);
    for (slot, tag) in slots {
        assert_eq!(slot.event_id, detail.event.id);
        let expected = match tag.unwrap().name.as_str() {
            "speaker" => 3,
            "volunteer" => 5,
            other => panic!("unexpected tag {other}"),
        };
        assert_eq!(slot.limit, expected);
    }

    let mut returned: Vec<(String, i32, i64)> = detail
        .slots
        .iter()
        .map(|s| (s.tag_name.clone(), s.slot.limit, s.signup_count))
        .collect();
    returned.sort();
    assert_eq!(
        returned,
        vec![("speaker".to_string(), 3, 0), ("volunteer".to_string(), 5, 0)]
    );
}

#[tokio::test]
async fn test_create_event_without_slots() {
    let db = setup_db().await;
    let group = create_group(&db, "Book club").await;

    let detail = EventService::create_event(&db, group.id, new_event(&[], false)).await.unwrap();
    assert!(detail.slots.is_empty());
    assert_eq!(slot::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_tag_leaves_nothing_behind() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;

    let err = EventService::create_event(&db, group.id, new_event(&[("speaker", 3), ("juggler", 1)], true))
        .await
        .unwrap_err();

    match err {
        EventError::UnknownTags(names) => assert_eq!(names, vec!["juggler".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(event::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(slot::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    let created = EventService::create_event(&db, group.id, new_event(&[("speaker", 2)], true))
        .await
        .unwrap();

    let patch = EventPatch {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    let updated = EventService::update_event(&db, created.event.id, patch).await.unwrap();

    assert_eq!(updated.event.title, "Renamed");
    assert_eq!(
        to_epoch_millis(&updated.event.start_date_time),
        to_epoch_millis(&created.event.start_date_time)
    );
    assert_eq!(updated.event.location, "Park");
    assert_eq!(updated.slots.len(), 1);

    let patch = EventPatch {
        end_date_time: Some(from_epoch_millis(1_800_000_000_000).unwrap()),
        ..Default::default()
    };
    let updated = EventService::update_event(&db, created.event.id, patch).await.unwrap();
    assert_eq!(to_epoch_millis(&updated.event.end_date_time), 1_800_000_000_000);
    assert_eq!(updated.event.title, "Renamed");
}

#[tokio::test]
async fn test_update_missing_event() {
    let db = setup_db().await;
    let err = EventService::update_event(&db, 404, EventPatch::default()).await.unwrap_err();
    assert!(matches!(err, EventError::NotFound(404)));
}

#[tokio::test]
async fn test_delete_event_removes_slots_and_signups() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    let user = create_user(&db, "attendee").await;
    let created = EventService::create_event(&db, group.id, new_event(&[("speaker", 2)], true))
        .await
        .unwrap();
    SignupService::create_signup(&db, user.id, created.slots[0].slot.id).await.unwrap();

    EventService::delete_event(&db, created.event.id).await.unwrap();

    assert_eq!(event::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(slot::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(signup::Entity::find().count(&db).await.unwrap(), 0);
    assert!(matches!(
        EventService::delete_event(&db, created.event.id).await,
        Err(EventError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_events_visibility_and_filters() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    let other_group = create_group(&db, "Garden").await;

    let public = EventService::create_event(&db, group.id, new_event(&[], true)).await.unwrap();
    let mut private_event = new_event(&[], false);
    private_event.title = "Board meeting".to_string();
    let private = EventService::create_event(&db, group.id, private_event).await.unwrap();
    let mut other_event = new_event(&[], true);
    other_event.title = "Planting day".to_string();
    other_event.description = "Seeds provided".to_string();
    EventService::create_event(&db, other_group.id, other_event).await.unwrap();

    let anonymous = EventService::list_events(&db, &EventFilter::default(), &[]).await.unwrap();
    assert_eq!(anonymous.len(), 2);
    assert!(anonymous.iter().all(|d| d.event.is_public));

    let admin = EventService::list_events(&db, &EventFilter::default(), &[group.id]).await.unwrap();
    assert_eq!(admin.len(), 3);

    let by_group = EventFilter {
        group_id: Some(group.id),
        ..Default::default()
    };
    let ids: Vec<i32> = EventService::list_events(&db, &by_group, &[group.id])
        .await
        .unwrap()
        .iter()
        .map(|d| d.event.id)
        .collect();
    assert_eq!(ids, vec![public.event.id, private.event.id]);

    let search = EventFilter {
        search: Some("Seeds".to_string()),
        ..Default::default()
    };
    let found = EventService::list_events(&db, &search, &[]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].event.title, "Planting day");

    let second_page = EventFilter {
        page: Some(2),
        page_size: Some(2),
        ..Default::default()
    };
    let page = EventService::list_events(&db, &second_page, &[group.id]).await.unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_list_events_paging_extremes() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    for _ in 0..3 {
        EventService::create_event(&db, group.id, new_event(&[], true)).await.unwrap();
    }

    let far_page = EventFilter {
        page: Some(u64::MAX),
        page_size: Some(2),
        ..Default::default()
    };
    assert!(EventService::list_events(&db, &far_page, &[]).await.unwrap().is_empty());

    let huge_page = EventFilter {
        page: Some(u64::MAX),
        page_size: Some(u64::MAX),
        ..Default::default()
    };
    assert!(EventService::list_events(&db, &huge_page, &[]).await.unwrap().is_empty());

    let huge_size = EventFilter {
        page_size: Some(u64::MAX),
        ..Default::default()
    };
    assert_eq!(EventService::list_events(&db, &huge_size, &[]).await.unwrap().len(), 3);
    assert!(MAX_PAGE_SIZE >= 3);
}

#[tokio::test]
async fn test_seed_tags_trims_and_skips_repeats() {
    let db = setup_db().await;

    let names = ["usher", "usher", " speaker ", "  ", " usher"].map(String::from);
    assert_eq!(seed_tags(&db, &names).await.unwrap(), 1);
    assert_eq!(seed_tags(&db, &names).await.unwrap(), 0);

    let all: Vec<String> = get_all_tags(&db).await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(all, vec!["speaker", "usher", "volunteer"]);
}

#[tokio::test]
async fn test_unique_violations_are_recognized() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    let user = create_user(&db, "attendee").await;
    let created = EventService::create_event(&db, group.id, new_event(&[("speaker", 5)], true))
        .await
        .unwrap();
    let slot_id = created.slots[0].slot.id;

    let insert_signup = || signup::ActiveModel {
        user_id: Set(user.id),
        slot_id: Set(slot_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    insert_signup().insert(&db).await.unwrap();
    let err = insert_signup().insert(&db).await.unwrap_err();
    assert!(is_unique_violation(&err));

    add_member(&db, group.id, user.id, false, false).await;
    let err = membership::ActiveModel {
        group_id: Set(group.id),
        user_id: Set(user.id),
        is_approved: Set(false),
        is_admin: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .unwrap_err();
    assert!(is_unique_violation(&err));

    let duplicate_tag = tag::ActiveModel {
        name: Set("speaker".to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap_err();
    assert!(is_unique_violation(&duplicate_tag));
}

#[tokio::test]
async fn test_signup_listing_is_newest_first() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    let user = create_user(&db, "attendee").await;
    let created = EventService::create_event(&db, group.id, new_event(&[("speaker", 5), ("volunteer", 5)], true))
        .await
        .unwrap();
    let second = EventService::create_event(&db, group.id, new_event(&[("speaker", 5)], true))
        .await
        .unwrap();

    let t1 = Utc::now() - Duration::hours(3);
    let t2 = Utc::now() - Duration::hours(2);
    let t3 = Utc::now() - Duration::hours(1);

    // Inserted out of order on purpose.
    let mut ids = Vec::new();
    for (slot_id, created_at) in [
        (created.slots[1].slot.id, t2),
        (second.slots[0].slot.id, t3),
        (created.slots[0].slot.id, t1),
    ] {
        let signup = signup::ActiveModel {
            user_id: Set(user.id),
            slot_id: Set(slot_id),
            created_at: Set(created_at),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        ids.push(signup.id);
    }

    let listing = SignupService::get_signups_for_user(&db, user.id).await.unwrap();
    let order: Vec<i32> = listing.iter().map(|(_, s)| s.id).collect();
    assert_eq!(order, vec![ids[1], ids[0], ids[2]]);

    assert_eq!(listing[0].0.event.id, second.event.id);
    assert_eq!(listing[1].0.event.id, created.event.id);
    assert_eq!(listing[2].0.event.id, created.event.id);

    let other = create_user(&db, "nobody").await;
    assert!(SignupService::get_signups_for_user(&db, other.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_signup_rules() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    let first = create_user(&db, "first").await;
    let second = create_user(&db, "second").await;

    let public = EventService::create_event(&db, group.id, new_event(&[("speaker", 1)], true))
        .await
        .unwrap();
    let slot_id = public.slots[0].slot.id;

    let signup = SignupService::create_signup(&db, first.id, slot_id).await.unwrap();
    assert_eq!(signup.slot_id, slot_id);

    assert!(matches!(
        SignupService::create_signup(&db, first.id, slot_id).await,
        Err(SignupError::AlreadySignedUp(_))
    ));
    assert!(matches!(
        SignupService::create_signup(&db, second.id, slot_id).await,
        Err(SignupError::SlotFull(_))
    ));
    assert!(matches!(
        SignupService::create_signup(&db, first.id, 9999).await,
        Err(SignupError::SlotNotFound(9999))
    ));

    let reloaded = EventService::load_detail(&db, public.event.clone()).await.unwrap();
    assert_eq!(reloaded.slots[0].signup_count, 1);

    // Private events take signups only from those who can read them.
    let private = EventService::create_event(&db, group.id, new_event(&[("volunteer", 3)], false))
        .await
        .unwrap();
    let private_slot = private.slots[0].slot.id;
    assert!(matches!(
        SignupService::create_signup(&db, second.id, private_slot).await,
        Err(SignupError::Forbidden)
    ));
    add_member(&db, group.id, second.id, true, false).await;
    assert!(matches!(
        SignupService::create_signup(&db, second.id, private_slot).await,
        Err(SignupError::Forbidden)
    ));
    GroupService::update_membership(&db, group.id, second.id, None, Some(true))
        .await
        .unwrap();
    SignupService::create_signup(&db, second.id, private_slot).await.unwrap();

    // Only the owner may cancel.
    assert!(matches!(
        SignupService::delete_signup(&db, second.id, signup.id).await,
        Err(SignupError::NotFound(_))
    ));
    SignupService::delete_signup(&db, first.id, signup.id).await.unwrap();
    SignupService::create_signup(&db, second.id, slot_id).await.unwrap();
}

#[tokio::test]
async fn test_zero_limit_slot_is_always_full() {
    let db = setup_db().await;
    let group = create_group(&db, "Conference").await;
    let user = create_user(&db, "attendee").await;
    let created = EventService::create_event(&db, group.id, new_event(&[("speaker", 0)], true))
        .await
        .unwrap();

    assert!(matches!(
        SignupService::create_signup(&db, user.id, created.slots[0].slot.id).await,
        Err(SignupError::SlotFull(_))
    ));
}

#[tokio::test]
async fn test_group_membership_lifecycle() {
    let db = setup_db().await;
    let founder = create_user(&db, "founder").await;
    let joiner = create_user(&db, "joiner").await;

    let (group, membership) = GroupService::create_group(&db, founder.id, " Hikers ".to_string(), String::new())
        .await
        .unwrap();
    assert_eq!(group.name, "Hikers");
    assert!(membership.is_approved && membership.is_admin);
    assert!(MembershipService::authorize(&db, founder.id, group.id).await.unwrap());

    let pending = GroupService::join_group(&db, group.id, joiner.id).await.unwrap();
    assert!(!pending.is_approved && !pending.is_admin);
    assert!(matches!(
        GroupService::join_group(&db, group.id, joiner.id).await,
        Err(GroupError::AlreadyMember { .. })
    ));

    let approved = GroupService::update_membership(&db, group.id, joiner.id, Some(true), None)
        .await
        .unwrap();
    assert!(approved.is_approved && !approved.is_admin);
    assert!(!MembershipService::authorize(&db, joiner.id, group.id).await.unwrap());

    GroupService::update_membership(&db, group.id, joiner.id, None, Some(true)).await.unwrap();
    assert!(MembershipService::authorize(&db, joiner.id, group.id).await.unwrap());

    assert!(matches!(
        GroupService::update_membership(&db, group.id, 9999, Some(true), None).await,
        Err(GroupError::MembershipNotFound { .. })
    ));
    assert!(matches!(
        GroupService::create_group(&db, founder.id, "   ".to_string(), String::new()).await,
        Err(GroupError::EmptyName)
    ));
}
