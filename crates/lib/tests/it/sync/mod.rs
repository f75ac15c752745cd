mod http_transport_tests;
mod replication_tests;
