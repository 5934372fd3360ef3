mod hierarchy_tests;
mod membership_tests;
mod related_objects_tests;
