use academy_server::db::{Filters, Pagination, Store};
use academy_server::models::{BranchId, Role, TenantId, User, UserId, UserStatus};
use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const TENANTS: usize = 20;
const USERS_PER_TENANT: usize = 500;

fn user(tenant_id: TenantId, branch_id: BranchId, i: usize) -> User {
    let now = Utc::now();
    User {
        id: UserId::new(),
        tenant_id,
        email: format!("member{i}@{tenant_id}.example.com"),
        password_hash: String::new(),
        first_name: format!("Member{i}"),
        last_name: "Bench".to_string(),
        phone: None,
        role: Role::Student,
        status: if i % 4 == 0 {
            UserStatus::Suspended
        } else {
            UserStatus::Active
        },
        branch_id: Some(branch_id),
        email_verified: true,
        email_verification_token: None,
        password_reset_token: None,
        password_reset_expires: None,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn benchmark_tenant_scoped_queries(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");

    // Many tenants sharing one table, so every query must skip foreign rows
    let store = Store::init();
    let branch = BranchId::new();
    let mut tenants = Vec::with_capacity(TENANTS);
    runtime.block_on(async {
        for _ in 0..TENANTS {
            let tenant = TenantId::new();
            for i in 0..USERS_PER_TENANT {
                store
                    .users
                    .create(user(tenant, branch, i))
                    .await
                    .expect("Failed to seed user");
            }
            tenants.push(tenant);
        }
    });
    let tenant = tenants[TENANTS / 2];

    let mut group = c.benchmark_group("tenant_scoped_queries");

    group.bench_function("find_all_first_page", |b| {
        let pagination = Pagination::default();
        let filters = Filters::default();
        b.iter(|| {
            runtime.block_on(store.users.find_all(
                black_box(tenant),
                &pagination,
                &filters,
            ))
        })
    });

    group.bench_function("find_all_filtered_sorted", |b| {
        let mut pagination = Pagination::new(3, 20);
        pagination.sort_by = Some("email".to_string());
        let filters = Filters {
            search: Some("member1".to_string()),
            status: Some("active".to_string()),
            branch_id: Some(branch),
        };
        b.iter(|| {
            runtime.block_on(store.users.find_all(
                black_box(tenant),
                &pagination,
                &filters,
            ))
        })
    });

    group.bench_function("find_by_email", |b| {
        let email = format!("member250@{tenant}.example.com");
        b.iter(|| runtime.block_on(store.users.find_by_email(black_box(tenant), &email)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_tenant_scoped_queries);
criterion_main!(benches);
