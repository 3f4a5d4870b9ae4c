/// GraphQL schema synthesis from table metadata
///
/// This module maps store attribute types to GraphQL types, translates field
/// arguments into store key conditions, and assembles the dynamic schema with
/// its scan, index and put-item resolvers.

mod arguments;
mod builder;
mod lifecycle;
mod resolver;
mod type_mapping;

pub use arguments::{
    coerce_value, key_arguments, resolve_key_name, to_item, to_key_condition, to_query_request,
    KeyCondition,
};
pub use builder::{build_input_type, build_object_type, synthesize_fields, SchemaBuilder};
pub use lifecycle::SchemaState;
pub use resolver::{
    create_index_resolver, create_put_resolver, create_scan_resolver, execute_put, execute_query,
    execute_scan, scan_projection,
};
pub use type_mapping::{
    attribute_to_graphql, attribute_type_ref, is_valid_graphql_name, map_input, map_output,
    FieldDescriptor,
};
