//! Wire shape of every service call: method, path, query string and body.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use shopdesk::domains::campaigns::{CampaignFilter, Channel};
use shopdesk::domains::customers::CustomerFilter;
use shopdesk::domains::invoices::{InvoiceFilter, InvoiceStatus};
use shopdesk::domains::tasks::{TaskPatch, TaskStatus};
use shopdesk::domains::{
    Appointments, Campaigns, Customers, Invoices, MembershipPlans, Paging, ServiceCatalog, Tasks, Technicians,
    Vehicles, WorkOrders,
};
use shopdesk::slice::{EntityId, Resource, ResourceService};
use shopdesk_api::{ApiError, Method};
use shopdesk_testing::MockTransport;
use std::sync::Arc;

fn service<R: Resource>(transport: &MockTransport) -> ResourceService<R> {
    ResourceService::new(Arc::new(transport.clone()))
}

fn query_of(transport: &MockTransport) -> Vec<(String, String)> {
    transport.requests().last().unwrap().query.pairs().to_vec()
}

#[tokio::test]
async fn list_omits_unset_filter_keys() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "customers", json!({ "data": [] }));

    let filter = CustomerFilter {
        paging: Paging {
            page: Some(2),
            search: Some("smith".to_string()),
            ..Paging::default()
        },
        membership_plan_id: None,
    };
    service::<Customers>(&transport).list(&filter).await.unwrap();

    let mut query = query_of(&transport);
    query.sort();
    assert_eq!(
        query,
        vec![
            ("page".to_string(), "2".to_string()),
            ("search".to_string(), "smith".to_string()),
        ]
    );
}

#[tokio::test]
async fn list_filters_use_backend_spelling() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "invoices", json!({ "data": [] }));
    transport.respond(Method::Get, "campaigns", json!({ "data": [] }));

    service::<Invoices>(&transport)
        .list(&InvoiceFilter {
            status: Some(InvoiceStatus::Overdue),
            customer_id: Some(EntityId::from("c-9")),
            ..InvoiceFilter::default()
        })
        .await
        .unwrap();
    let query = query_of(&transport);
    assert!(query.contains(&("status".to_string(), "overdue".to_string())));
    assert!(query.contains(&("customerId".to_string(), "c-9".to_string())));

    service::<Campaigns>(&transport)
        .list(&CampaignFilter {
            channel: Some(Channel::Sms),
            ..CampaignFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(query_of(&transport), vec![("type".to_string(), "sms".to_string())]);
}

#[tokio::test]
async fn list_reads_collection_key_and_pagination() {
    let transport = MockTransport::new();
    transport.respond(
        Method::Get,
        "services/work-orders",
        json!({
            "success": true,
            "data": {
                "workOrders": [{ "_id": "wo-1", "status": "in-progress" }],
                "pagination": { "page": 1, "limit": 20, "total": 41, "totalPages": 3 }
            }
        }),
    );

    let page = service::<WorkOrders>(&transport)
        .list(&Default::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, EntityId::from("wo-1"));
    let pagination = page.pagination.unwrap();
    assert_eq!((pagination.total, pagination.total_pages), (41, 3));
}

#[tokio::test]
async fn every_domain_uses_its_own_paths() {
    let transport = MockTransport::new();

    async fn touch<R: Resource>(transport: &MockTransport) {
        let service = service::<R>(transport);
        let _ = service.list(&Default::default()).await;
        let _ = service.get(&EntityId::from("42")).await;
        let _ = service.stats().await;
        let _ = service.delete(&EntityId::from("42")).await;
    }

    touch::<Customers>(&transport).await;
    touch::<Vehicles>(&transport).await;
    touch::<ServiceCatalog>(&transport).await;
    touch::<WorkOrders>(&transport).await;
    touch::<Technicians>(&transport).await;
    touch::<Invoices>(&transport).await;
    touch::<Appointments>(&transport).await;
    touch::<Tasks>(&transport).await;
    touch::<MembershipPlans>(&transport).await;
    touch::<Campaigns>(&transport).await;

    for base in [
        "customers",
        "vehicles",
        "services/catalog",
        "services/work-orders",
        "services/technicians",
        "invoices",
        "appointments",
        "tasks",
        "memberships/plans",
        "campaigns",
    ] {
        assert_eq!(transport.calls(Method::Get, base), 1, "{base}");
        assert_eq!(transport.calls(Method::Get, &format!("{base}/42")), 1, "{base}");
        assert_eq!(transport.calls(Method::Get, &format!("{base}/stats/overview")), 1, "{base}");
        assert_eq!(transport.calls(Method::Delete, &format!("{base}/42")), 1, "{base}");
    }
    assert_eq!(transport.requests().len(), 40);
}

#[tokio::test]
async fn update_sends_only_changed_fields() {
    let transport = MockTransport::new();
    transport.respond(
        Method::Put,
        "tasks/t-1",
        json!({ "data": { "id": "t-1", "title": "Order parts", "status": "done" } }),
    );

    let task = service::<Tasks>(&transport)
        .update(
            &EntityId::from("t-1"),
            &TaskPatch {
                status: Some(TaskStatus::Done),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Done);
    let request = transport.requests().pop().unwrap();
    assert_eq!(request.body, Some(json!({ "status": "done" })));
}

#[tokio::test]
async fn delete_prefers_backend_message() {
    let transport = MockTransport::new();
    transport.respond(Method::Delete, "campaigns/a", json!({ "success": true, "message": "Campaign archived" }));
    transport.respond(Method::Delete, "campaigns/b", json!({ "success": true }));

    let campaigns = service::<Campaigns>(&transport);
    assert_eq!(campaigns.delete(&EntityId::from("a")).await.unwrap(), "Campaign archived");
    assert_eq!(campaigns.delete(&EntityId::from("b")).await.unwrap(), "Campaign deleted");
}

#[tokio::test]
async fn unsuccessful_envelope_is_a_rejection() {
    let transport = MockTransport::new();
    transport.respond(
        Method::Get,
        "vehicles/v-1",
        json!({ "success": false, "message": "Vehicle not found" }),
    );

    let error = service::<Vehicles>(&transport)
        .get(&EntityId::from("v-1"))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Rejected(_)));
    assert_eq!(error.user_message(), "Vehicle not found");
}

#[tokio::test]
async fn errors_propagate_unchanged() {
    let transport = MockTransport::new();
    transport.fail(Method::Get, "invoices/stats/overview", ApiError::Timeout);

    let error = service::<Invoices>(&transport).stats().await.unwrap_err();

    assert!(matches!(error, ApiError::Timeout));
    assert_eq!(transport.calls(Method::Get, "invoices/stats/overview"), 1);
}

#[tokio::test]
async fn item_ids_stay_one_path_segment() {
    let transport = MockTransport::new();
    transport.respond(Method::Delete, "customers/..%2Finvoices%2Finv-9", json!({ "success": true }));
    transport.respond(
        Method::Get,
        "customers/c1%23x",
        json!({ "data": { "_id": "c1#x", "firstName": "Ada", "lastName": "Byron" } }),
    );

    let customers = service::<Customers>(&transport);
    customers.delete(&EntityId::from("../invoices/inv-9")).await.unwrap();
    let customer = customers.get(&EntityId::from("c1#x")).await.unwrap();
    let _ = customers.get(&EntityId::from("a b?c=1")).await;

    assert_eq!(customer.id, EntityId::from("c1#x"));
    let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "customers/..%2Finvoices%2Finv-9".to_string(),
            "customers/c1%23x".to_string(),
            "customers/a%20b%3Fc%3D1".to_string(),
        ]
    );
    assert_eq!(transport.calls(Method::Delete, "invoices/inv-9"), 0);
}

#[tokio::test]
async fn dot_segment_ids_are_refused_before_sending() {
    let transport = MockTransport::new();
    let vehicles = service::<Vehicles>(&transport);

    for id in ["", ".", ".."] {
        let error = vehicles.delete(&EntityId::from(id)).await.unwrap_err();
        assert!(matches!(error, ApiError::InvalidRequest(_)), "{id:?}");
    }
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn list_decodes_records_with_raw_and_virtual_ids() {
    let transport = MockTransport::new();
    transport.respond(
        Method::Get,
        "customers",
        json!({
            "success": true,
            "data": [
                { "_id": "c-1", "id": "c-1", "firstName": "Ada", "lastName": "Lovelace" },
                { "_id": "c-2", "firstName": "Grace", "lastName": "Hopper" }
            ]
        }),
    );

    let page = service::<Customers>(&transport)
        .list(&Default::default())
        .await
        .unwrap();

    let ids: Vec<&str> = page.items.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c-1", "c-2"]);
}
