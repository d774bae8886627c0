/*
 * Responsibility
 * - handler / client から使う横断的な service の公開
 */
pub mod id_codec;
pub mod policy;
