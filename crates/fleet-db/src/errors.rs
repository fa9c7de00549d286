// [crates/fleet-db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V11.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION:
 * 1. KINDS NOT TYPES: Distingue fallo transitorio de fallo de esquema/lógica
 *    sin que el llamador tenga que inspeccionar `sqlx::Error` a mano.
 * 2. ZERO ABBREVIATIONS: Nomenclatura nominal, prefijos de estrato por
 *    variante para su lectura inmediata en los logs.
 *    =================================================================
 */

use thiserror::Error;

/// Database-layer error catalog. Variants map onto the error-handling
/// design's "database transient" / "database logic" taxonomy so callers can
/// distinguish a retryable failure from one that should count toward
/// `MAX_STORE_ERRORS` without string-matching `sqlx::Error`.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("[L3_DB_NET_FAULT]: FLEET_UPLINK_SEVERED -> {0}")]
    Connection(String),

    #[error("[L3_DB_CONFIG_FAULT]: CONFIGURACION_INVALIDA -> {0}")]
    Configuration(String),

    #[error("[L3_DB_QUERY_FAULT]: CONSULTA_RECHAZADA -> {0}")]
    Query(#[from] sqlx::Error),

    #[error("[L3_DB_MAPPING_FAULT]: FILA_NO_MAPEABLE -> {0}")]
    Mapping(String),

    #[error("[L3_DB_LEASE_FAULT]: ARRENDAMIENTO_INEXISTENTE")]
    LeaseNotFound,
}
