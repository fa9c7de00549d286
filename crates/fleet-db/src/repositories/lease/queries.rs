/// The reclaim predicate shared by every acquire stage: a row qualifies if
/// it was never leased, its last health check has gone stale, or its
/// previous holder exited without releasing it.
pub const RECLAIMABLE: &str = "
    (process_health_check IS NULL
        OR process_health_check < now() - ($1 || ' seconds')::interval
        OR running = false
        OR running IS NULL)
";

pub fn acquire_data_load(stale_data_seconds: i64) -> String {
    format!(
        "WITH candidate AS (
            SELECT store_process_id FROM store_process
            WHERE (last_data_load IS NULL OR last_data_load < now() - interval '{stale_data_seconds} seconds')
              AND {RECLAIMABLE}
            ORDER BY created_at ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        UPDATE store_process
        SET running = true,
            service = $2,
            process_health_check = now(),
            last_worker_start = now()
        FROM candidate
        WHERE store_process.store_process_id = candidate.store_process_id
        RETURNING store_process.*"
    )
}

pub fn acquire_etl(data_load_schedule: &str, dim_etl_schedule: &str) -> String {
    format!(
        "WITH candidate AS (
            SELECT store_process_id FROM store_process
            WHERE last_data_load >= CURRENT_DATE + interval '{data_load_schedule}'
              AND (last_dm_etl IS NULL OR last_dm_etl < CURRENT_DATE + interval '{dim_etl_schedule}')
              AND {RECLAIMABLE}
            ORDER BY created_at ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        UPDATE store_process
        SET running = true,
            service = $2,
            process_health_check = now()
        FROM candidate
        WHERE store_process.store_process_id = candidate.store_process_id
        RETURNING store_process.*"
    )
}

pub fn acquire_export(dim_etl_schedule: &str, export_schedule: &str) -> String {
    format!(
        "WITH candidate AS (
            SELECT store_process_id FROM store_process
            WHERE last_dm_etl >= CURRENT_DATE + interval '{dim_etl_schedule}'
              AND (last_client_load IS NULL OR last_client_load < CURRENT_DATE + interval '{export_schedule}')
              AND {RECLAIMABLE}
            ORDER BY created_at ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        UPDATE store_process
        SET running = true,
            service = $2,
            process_health_check = now()
        FROM candidate
        WHERE store_process.store_process_id = candidate.store_process_id
        RETURNING store_process.*"
    )
}

pub const FINALIZE_DATA_LOAD_SUCCESS: &str = "
    UPDATE store_process
    SET running = false, last_worker_end = now(), last_data_load = now(), process_health_check = now()
    WHERE store_process_id = $1
";

pub const FINALIZE_DATA_LOAD_ERROR: &str = "
    UPDATE store_process
    SET running = false, last_worker_end = now(), process_health_check = now()
    WHERE store_process_id = $1
";

pub const FINALIZE_ETL: &str = "
    UPDATE store_process SET last_dm_etl = now(), running = false WHERE store_process_id = $1
";

pub const FINALIZE_EXPORT: &str = "
    UPDATE store_process SET last_client_load = now(), running = false WHERE store_process_id = $1
";

pub const HEARTBEAT_LEASES: &str = "
    UPDATE store_process SET process_health_check = now()
    WHERE service = $1 AND store_process_id = ANY($2)
";

pub const UPSERT_SERVICE_HEALTH: &str = "
    INSERT INTO service_health (service_type, service_name, version, last_health_check)
    VALUES ($1, $2, $3, now())
    ON CONFLICT (service_type, service_name)
    DO UPDATE SET version = EXCLUDED.version, last_health_check = now()
";
